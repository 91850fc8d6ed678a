use anyhow::{Context, Result};
use lazy_regex::regex_captures;
use std::path::Path;
use tracing::{debug, error};

/// One entry of the specialist directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialist {
    pub phone: String,
    pub name: String,
    pub services: String,
    pub description: String,
}

/// Parse a `+<phone>. name, services, description` line.
pub fn parse_line(line: &str) -> Option<Specialist> {
    let (_, phone, name, services, description) = regex_captures!(
        r"^(\+\d{10,12})\.\s*([^,]+),\s*([^,]+),\s*(.*)$",
        line.trim()
    )?;

    Some(Specialist {
        phone: phone.to_string(),
        name: name.trim().to_string(),
        services: services.trim().to_string(),
        description: description.trim().to_string(),
    })
}

/// Read the specialist directory. Blank and malformed lines are skipped;
/// a missing file is an error.
pub async fn load(path: &Path) -> Result<Vec<Specialist>> {
    if !path.exists() {
        error!(file = %path.display(), "Specialists file not found");
        anyhow::bail!("Specialists file not found: {}", path.display());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read specialists file: {}", path.display()))?;

    let specialists: Vec<Specialist> = content.lines().filter_map(parse_line).collect();
    debug!("Loaded {} specialists from {}", specialists.len(), path.display());
    Ok(specialists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let specialist =
            parse_line("+12345678901. Dr. Smith, Dentistry, Root canals and cleanings").unwrap();
        assert_eq!(
            specialist,
            Specialist {
                phone: "+12345678901".to_string(),
                name: "Dr. Smith".to_string(),
                services: "Dentistry".to_string(),
                description: "Root canals and cleanings".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_line_trims_fields() {
        let specialist = parse_line("  +7900123456.Ivan ,  Plumbing ,  Boilers, pipes  ").unwrap();
        assert_eq!(specialist.phone, "+7900123456");
        assert_eq!(specialist.name, "Ivan");
        assert_eq!(specialist.services, "Plumbing");
        assert_eq!(specialist.description, "Boilers, pipes");
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(parse_line("Dr. Smith, Dentistry, Root canals").is_none());
        assert!(parse_line("12345678901. Dr. Smith, Dentistry, Root canals").is_none());
        assert!(parse_line("+123. Dr. Smith, Dentistry, Root canals").is_none());
        assert!(parse_line("+12345678901 Dr. Smith, Dentistry, Root canals").is_none());
        assert!(parse_line("+12345678901. Dr. Smith").is_none());
        assert!(parse_line("").is_none());
    }

    #[tokio::test]
    async fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specialists.txt");
        std::fs::write(
            &path,
            "+12345678901. Dr. Smith, Dentistry, Root canals and cleanings\n\
             \n\
             no phone here, at all, really\n\
             +79001234567. Ivan Petrov, Plumbing, Pipe repair\n",
        )
        .unwrap();

        let specialists = load(&path).await.unwrap();
        assert_eq!(specialists.len(), 2);
        assert_eq!(specialists[0].name, "Dr. Smith");
        assert_eq!(specialists[1].phone, "+79001234567");
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let (logs, _guard) = crate::testing::capture_logs();
        let err = load(Path::new("/nonexistent/specialists.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Specialists file not found"));

        let errors = logs.at_level(tracing::Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].fields["file"], "/nonexistent/specialists.txt");
    }
}
