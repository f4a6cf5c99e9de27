//! Application constants for the INMET processor
//!
//! Default layout markers, column allowlists and delimiters for INMET
//! automatic-station exports. Everything here is only a default: the
//! values are copied into [`crate::config::ProcessorConfig`] and can be
//! overridden there.

// =============================================================================
// File Layout
// =============================================================================

/// Literal start of the real tabular header line
pub const DEFAULT_HEADER_SIGNATURE: &str = "Data;Hora";

/// 0-based line of the header in the rigid export layout
pub const FIXED_HEADER_LINE: usize = 8;

/// Minimum number of lines a rigid-layout file must have (header plus one data line)
pub const FIXED_MIN_LINES: usize = 10;

/// 0-based metadata line carrying the station name (`ESTACAO:;NAME`)
pub const STATION_METADATA_LINE: usize = 2;

/// Metadata key naming the station when the fixed line yields nothing
pub const STATION_METADATA_KEY: &str = "ESTACAO";

/// File name pattern used when the metadata carries no station,
/// e.g. `INMET_NE_PE_A322_GARANHUNS_01-01-2023_A_31-12-2023.CSV`
pub const STATION_FILENAME_PATTERN: &str = r"_([A-Z\s]+)_\d";

/// Extensions picked up when an input is a directory
pub const CSV_EXTENSIONS: &[&str] = &["csv", "CSV"];

// =============================================================================
// Delimiters and Markers
// =============================================================================

/// Delimiter of the source tables
pub const INPUT_DELIMITER: char = ';';

/// Separator between key and value in metadata lines
pub const METADATA_DELIMITER: char = ':';

/// Delimiter of the consolidated output
pub const OUTPUT_DELIMITER: char = ',';

/// Name of the prepended station column
pub const STATION_COLUMN: &str = "STATION";

/// Unit token accepted after digits by the numeric-shape predicate (`0000 UTC`)
pub const NUMERIC_UNIT_SUFFIX: &str = "UTC";

/// How a missing value is rendered in CSV output (empty loads as NULL)
pub const DEFAULT_MISSING_MARKER: &str = "";

// =============================================================================
// Column Allowlists
// =============================================================================

/// Columns converted to floating point in the warehouse
pub const NUMERIC_COLUMNS: &[&str] = &[
    "PRECIPITACAO_TOTAL",
    "PR_ATM_EST",
    "PR_MAX_1H",
    "PR_MIN_1H",
    "RADIACAO_GLOBAL",
    "TEMP_BULBO_SECO",
    "TEMP_PONTO_ORVALHO",
    "TEMP_MAX_1H",
    "TEMP_MIN_1H",
    "ORVALHO_MAX_1H",
    "ORVALHO_MIN_1H",
    "UMID_REL_MAX_1H",
    "UMID_REL_MIN_1H",
    "UMIDADE_REL",
    "VENTO_DIRECAO",
    "VENTO_RAJADA_MAX",
    "VENTO_VELOCIDADE",
    "LATITUDE",
    "LONGITUDE",
    "ALTITUDE",
];

/// Descriptive columns whose values may carry the table delimiter
pub const DIRTY_COLUMNS: &[&str] = &[
    "REGIAO",
    "UF",
    "ESTACAO",
    "CODIGO (WMO)",
    "LATITUDE",
    "LONGITUDE",
    "ALTITUDE",
    "DATA DE FUNDACAO",
];
