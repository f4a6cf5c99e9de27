//! Multi-station processing integration tests

use super::{inmet_preamble, write_file};
use crate::config::ProcessorConfig;
use crate::processor::DatasetProcessor;
use crate::processor::discovery::FileDiscovery;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn station_export(station: &str, temperature: &str) -> String {
    format!(
        "REGIAO:;NE\nUF:;PE\nESTACAO:;{}\nData;Hora;TEMP_BULBO_SECO\n01/01/2023;0000 UTC;{}\n",
        station, temperature
    )
}

#[test]
fn test_two_stations_consolidated() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_file(temp_dir.path(), "a.csv", station_export("A", "23,5"));
    let b = write_file(temp_dir.path(), "b.csv", station_export("B", "24,1"));
    let output_path = temp_dir.path().join("out.csv");

    let stats = DatasetProcessor::new(output_path.clone())
        .unwrap()
        .process(&[b, a])
        .unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.total_rows, 2);

    let output = fs::read_to_string(&output_path).unwrap();
    assert_eq!(
        output,
        "STATION,Data,Hora,TEMP_BULBO_SECO\n\
         A,01/01/2023,0000 UTC,23.5\n\
         B,01/01/2023,0000 UTC,24.1\n"
    );
}

#[test]
fn test_two_stations_with_short_preambles() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_file(
        temp_dir.path(),
        "a.csv",
        "ESTACAO:;A\nData;Hora;TEMP_BULBO_SECO\n01/01/2023;0000 UTC;23,5\n",
    );
    let b = write_file(
        temp_dir.path(),
        "b.csv",
        "REGIAO:;NE\nESTACAO:;B\nData;Hora;TEMP_BULBO_SECO\n01/01/2023;0000 UTC;24,1\n",
    );
    let output_path = temp_dir.path().join("out.csv");

    DatasetProcessor::new(output_path.clone())
        .unwrap()
        .process(&[a, b])
        .unwrap();

    let output = fs::read_to_string(&output_path).unwrap();
    assert_eq!(
        output,
        "STATION,Data,Hora,TEMP_BULBO_SECO\n\
         A,01/01/2023,0000 UTC,23.5\n\
         B,01/01/2023,0000 UTC,24.1\n"
    );
}

#[test]
fn test_station_cell_on_every_row() {
    let temp_dir = TempDir::new().unwrap();
    let mut inputs = Vec::new();
    for (name, station) in [("x.csv", "RECIFE"), ("y.csv", "GARANHUNS"), ("z.csv", "PETROLINA")] {
        let rows: String = (0..24)
            .map(|hour| format!("2023-01-01;{:02}00 UTC;{},5\n", hour, 20 + hour % 5))
            .collect();
        let content = format!(
            "{}Data;Hora UTC;TEMP_BULBO_SECO\n{}",
            inmet_preamble(station),
            rows
        );
        inputs.push(write_file(temp_dir.path(), name, content));
    }
    let output_path = temp_dir.path().join("all.csv");

    let stats = DatasetProcessor::new(output_path.clone())
        .unwrap()
        .process(&inputs)
        .unwrap();
    assert_eq!(stats.total_rows, 72);

    let output = fs::read_to_string(&output_path).unwrap();
    let mut reader = csv::Reader::from_reader(output.as_bytes());
    let stations: Vec<String> = reader
        .records()
        .map(|record| record.unwrap()[0].to_string())
        .collect();

    assert_eq!(stations.len(), 72);
    assert!(stations[..24].iter().all(|s| s == "RECIFE"));
    assert!(stations[24..48].iter().all(|s| s == "GARANHUNS"));
    assert!(stations[48..].iter().all(|s| s == "PETROLINA"));
}

#[test]
fn test_station_from_file_name_when_line_empty() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_file(
        temp_dir.path(),
        "INMET_NE_PE_A301_RECIFE_01-01-2024_A_31-12-2024.CSV",
        "REGIAO:;NE\nUF:;PE\nESTACAO:;\nData;Hora;UMIDADE_REL\n2024-01-01;0000 UTC;80\n",
    );
    let output_path = temp_dir.path().join("all.csv");

    DatasetProcessor::new(output_path.clone())
        .unwrap()
        .process(&[input])
        .unwrap();

    let output = fs::read_to_string(&output_path).unwrap();
    assert!(output.lines().nth(1).unwrap().starts_with("RECIFE,"));
}

#[test]
fn test_duplicate_paths_processed_once() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().canonicalize().unwrap();
    let a = write_file(&dir, "a.csv", station_export("A", "23,5"));
    let b = write_file(&dir, "b.csv", station_export("B", "24,1"));
    let output_path = dir.join("out").join("all.csv");

    let inputs = vec![
        a.clone(),
        dir.join(".").join("a.csv"),
        dir.join("A.CSV"),
        b.clone(),
        b.clone(),
    ];

    let stats = DatasetProcessor::new(output_path.clone())
        .unwrap()
        .process(&inputs)
        .unwrap();

    assert_eq!(stats.files_seen, 5);
    assert_eq!(stats.duplicates_removed, 3);
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.total_rows, 2);
}

#[test]
fn test_directory_discovery_then_merge() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("2023");
    fs::create_dir_all(&input_dir).unwrap();
    write_file(&input_dir, "b.CSV", station_export("B", "24,1"));
    write_file(&input_dir, "a.csv", station_export("A", "23,5"));
    write_file(&input_dir, "readme.txt", "not an export");
    let output_path = temp_dir.path().join("all.csv");

    let inputs: Vec<PathBuf> = FileDiscovery::new([input_dir.to_string_lossy().to_string()])
        .discover_csv_files()
        .unwrap();

    let stats = DatasetProcessor::with_config(output_path, ProcessorConfig::default())
        .unwrap()
        .process(&inputs)
        .unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.total_rows, 2);
}
