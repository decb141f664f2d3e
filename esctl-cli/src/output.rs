//! Table output in plain, JSON or CSV form

use anyhow::Result;
use esctl::OutputFormat;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Renders tables for listing commands.
///
/// Free-form messages go to stdout in plain mode and to stderr otherwise, so
/// JSON and CSV output stays machine readable.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn message(&self, text: &str) {
        match self.format {
            OutputFormat::Plain => println!("{}", text),
            _ => eprintln!("{}", text),
        }
    }

    pub fn write(&self, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render(&mut out, headers, rows)?;
        out.flush()?;
        Ok(())
    }

    pub fn render<W: Write>(&self, out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        match self.format {
            OutputFormat::Plain => render_plain(out, headers, rows),
            OutputFormat::Json => render_json(out, headers, rows),
            OutputFormat::Csv => render_csv(out, headers, rows),
        }
    }
}

fn render_plain<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == last {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    writeln!(out, "{}", line(headers.to_vec()))?;
    for row in rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

fn render_json<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let items: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(h, cell)| (h.to_string(), Value::String(cell.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &items)?;
    writeln!(out)?;
    Ok(())
}

fn render_csv<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["node-1".to_string(), "10.0.0.1".to_string()],
            vec!["data-node-22".to_string(), "10.0.0.2".to_string()],
        ]
    }

    fn render(format: OutputFormat) -> String {
        let mut buf = Vec::new();
        Formatter::new(format)
            .render(&mut buf, &["Node Name", "IP"], &rows())
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_aligns_columns() {
        assert_eq!(
            render(OutputFormat::Plain),
            "Node Name    IP\nnode-1       10.0.0.1\ndata-node-22 10.0.0.2\n"
        );
    }

    #[test]
    fn test_plain_width_counts_characters() {
        let mut buf = Vec::new();
        Formatter::new(OutputFormat::Plain)
            .render(&mut buf, &["Nœud", "IP"], &[vec!["ab".to_string(), "x".to_string()]])
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Nœud IP\nab   x\n");
    }

    #[test]
    fn test_json_keys_by_header() {
        let value: Value = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
        assert_eq!(value[1]["Node Name"], "data-node-22");
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_csv_has_header_row() {
        assert_eq!(
            render(OutputFormat::Csv),
            "Node Name,IP\nnode-1,10.0.0.1\ndata-node-22,10.0.0.2\n"
        );
    }

    #[test]
    fn test_json_empty_table_is_empty_array() {
        let mut buf = Vec::new();
        Formatter::new(OutputFormat::Json)
            .render(&mut buf, &["Node Name"], &[])
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]\n");
    }
}
