//! Project list loading from JSON or CSV files.

use std::{fs, path::Path};

use schemars::schema::RootSchema;
use serde::Deserialize;
use tracing::info;

use crate::{error::LoadError, model::ProjectRecord};

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectFile {
    List(Vec<ProjectRecord>),
    Wrapped { projects: Vec<ProjectRecord> },
}

pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let read = || {
        fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let projects = match extension.as_deref() {
        Some("json") => parse_json(&read()?)?,
        Some("csv") => parse_csv(&read()?)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };
    info!(path = %path.display(), count = projects.len(), "loaded projects");
    Ok(projects)
}

pub fn parse_json(bytes: &[u8]) -> Result<Vec<ProjectRecord>, LoadError> {
    Ok(match serde_json::from_slice::<ProjectFile>(bytes)? {
        ProjectFile::List(projects) | ProjectFile::Wrapped { projects } => projects,
    })
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ProjectRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    reader
        .deserialize::<ProjectRecord>()
        .map(|row| row.map_err(LoadError::from))
        .collect()
}

/// JSON schema of a project file (a list of records).
pub fn project_file_schema() -> RootSchema {
    schemars::schema_for!(Vec<ProjectRecord>)
}

/// Sample portfolio shown when nothing else is configured.
pub fn demo_projects() -> Vec<ProjectRecord> {
    let rows = [
        ("NET-01", "Network Core Refresh", "2024-01-08", "2024-04-26", 100.0, "Complete"),
        ("ERP-02", "ERP Finance Module Rollout", "2024-02-05", "2024-09-30", 72.0, "Testing"),
        ("WEB-03", "Customer Portal Redesign", "2024-03-18", "2024-08-16", 45.0, "Design"),
        ("DAT-04", "Data Warehouse Migration", "2024-04-01", "2024-12-20", 30.0, "Development"),
        ("SEC-05", "Zero Trust Access", "2024-06-03", "2024-11-29", 12.0, "Planning"),
        ("MOB-06", "Field Service Mobile App", "2024-05-13", "2024-10-25", 88.0, "Review"),
        ("OPS-07", "Observability Platform", "2024-07-01", "2025-01-31", 5.0, "Deployment"),
    ];
    rows.into_iter()
        .map(|(code, name, start, end, pct, phase)| ProjectRecord {
            code: code.to_string(),
            name: name.to_string(),
            start_date: start.to_string(),
            target_completion_date: end.to_string(),
            completion_percentage: pct,
            current_phase: phase.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Phase;

    #[test]
    fn json_array_with_camel_case_keys() {
        let raw = br#"[
            {"code":"P1","name":"Alpha","startDate":"2024-01-01","targetCompletionDate":"2024-03-01","completionPercentage":50,"currentPhase":"Design"},
            {"code":"P2","name":"Beta","startDate":"2024-02-01","targetCompletionDate":"2024-04-01","completionPercentage":100,"currentPhase":"Complete"}
        ]"#;
        let projects = parse_json(raw).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].code, "P1");
        assert_eq!(projects[1].phase(), Phase::Complete);
        assert_eq!(projects[1].completion_percentage, 100.0);
    }

    #[test]
    fn wrapped_json_with_snake_case_keys() {
        let raw = br#"{"projects":[
            {"code":"X","name":"Xray","start_date":"2024-05-01","target_completion_date":"2024-06-01","completion_percentage":10.5,"current_phase":"review"}
        ]}"#;
        let projects = parse_json(raw).unwrap();
        assert_eq!(projects[0].target_completion_date, "2024-06-01");
        assert_eq!(projects[0].phase(), Phase::Review);
    }

    #[test]
    fn csv_rows_keep_order() {
        let raw = b"code,name,startDate,targetCompletionDate,completionPercentage,currentPhase\n\
                    A, First ,2024-01-01,2024-02-01,0,Planning\n\
                    B,Second,2024-01-15,2024-03-01,55.5,Mystery\n";
        let projects = parse_csv(raw).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "First");
        assert_eq!(projects[1].completion_percentage, 55.5);
        assert_eq!(projects[1].phase(), Phase::Planning);
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("list.JSON");
        fs::write(&json, serde_json::to_vec(&demo_projects()).unwrap()).unwrap();
        assert_eq!(load_projects(&json).unwrap(), demo_projects());

        let txt = dir.path().join("list.txt");
        fs::write(&txt, "whatever").unwrap();
        assert!(matches!(
            load_projects(&txt),
            Err(LoadError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            load_projects(&dir.path().join("missing.csv")),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(parse_json(b"{\"nope\": 1}"), Err(LoadError::Json(_))));
    }

    #[test]
    fn schema_describes_record_fields() {
        let schema = serde_json::to_string(&project_file_schema()).unwrap();
        assert!(schema.contains("targetCompletionDate"));
        assert!(schema.contains("currentPhase"));
    }
}
