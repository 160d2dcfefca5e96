//! Plain-text survey reports

use std::fmt;

/// Ordered report lines for one input layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    /// Report starting with the standard header.
    ///
    /// The date line is left out when no timestamp is given.
    pub fn with_header(title: &str, timestamp: Option<&str>, layer_name: &str) -> Self {
        let mut report = Self::default();
        report.push(title);
        if let Some(ts) = timestamp {
            report.push(format!("Fecha: {}", ts));
        }
        report.push(format!("Capa de origen: {}", layer_name));
        report.blank();
        report
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn extend(&mut self, other: Report) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        let r = Report::with_header("REPORTE", Some("2024-05-01 10:00:00"), "lotes");
        assert_eq!(
            r.lines(),
            &["REPORTE", "Fecha: 2024-05-01 10:00:00", "Capa de origen: lotes", ""]
        );
    }

    #[test]
    fn test_header_without_date() {
        let r = Report::with_header("REPORTE", None, "lotes");
        assert_eq!(r.len(), 3);
        assert_eq!(r.to_string(), "REPORTE\nCapa de origen: lotes\n");
    }
}
