use anyhow::{Result, bail};

use crate::args::Cli;
use mailprobe_lib::{MxError, MxRecord, VerificationReport};

/// `--out` only applies to machine-readable formats.
pub fn check_destination(format: &str, out: Option<&str>) -> Result<()> {
    if format == "human" {
        if let Some(path) = out {
            bail!("--out {path} requires --format json|ndjson|csv");
        }
    }
    Ok(())
}

pub fn emit(rows: &[VerificationReport], cli: &Cli) -> Result<()> {
    check_destination(&cli.format, cli.out.as_deref())?;
    match cli.format.as_str() {
        "human" => {
            for row in rows {
                print_human(row, cli.transcript);
            }
            Ok(())
        }
        "json" => emit_json(rows, cli.out.as_deref()),
        "ndjson" => emit_ndjson(rows, cli.out.as_deref()),
        "csv" => emit_csv(rows, cli.out.as_deref()),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn emit_mx(
    domain: &str,
    records: Result<Vec<MxRecord>, MxError>,
    format: &str,
    out: Option<&str>,
) -> Result<()> {
    check_destination(format, out)?;
    match format {
        "human" => {
            match records {
                Ok(records) if records.is_empty() => println!("{domain}: no MX records"),
                Ok(records) => {
                    println!("{domain}:");
                    for r in &records {
                        println!("  {:>5} {}", r.preference, r.exchange);
                    }
                }
                Err(err) => println!("{domain}: error: {err}"),
            }
            Ok(())
        }
        "json" | "ndjson" => emit_mx_json(domain, records, out),
        other => bail!("unknown --format '{other}' for mx, use: human|json"),
    }
}

fn print_human(row: &VerificationReport, transcript: bool) {
    if row.result.is_deliverable() {
        println!("[OK]      {} :: {}", row.address, row.result);
    } else {
        println!("[INVALID] {} :: {}", row.address, row.result);
    }
    if let Some(err) = &row.malformed {
        println!("          malformed: {err}");
    }
    if let Some(err) = &row.dns_error {
        println!("          dns: {err}");
    }
    if transcript {
        if let Some(probe) = &row.probe {
            for line in &probe.transcript {
                println!("          {line}");
            }
        }
    }
}

#[cfg(feature = "with-serde")]
fn emit_json(rows: &[VerificationReport], out: Option<&str>) -> Result<()> {
    let mut s = serde_json::to_string_pretty(rows)?;
    s.push('\n');
    write_or_print(out, s.as_bytes())
}

#[cfg(not(feature = "with-serde"))]
fn emit_json(_: &[VerificationReport], _: Option<&str>) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn emit_ndjson(rows: &[VerificationReport], out: Option<&str>) -> Result<()> {
    let mut buf = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut buf, row)?;
        buf.push(b'\n');
    }
    write_or_print(out, &buf)
}

#[cfg(not(feature = "with-serde"))]
fn emit_ndjson(_: &[VerificationReport], _: Option<&str>) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn emit_csv(rows: &[VerificationReport], out: Option<&str>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "address",
        "well_formed",
        "valid_domain",
        "valid_mailbox",
        "check_error",
        "mx_host",
        "dns_error",
    ])?;
    for row in rows {
        // colonnes stables, vides quand non déterminé
        let check_error = row
            .result
            .check_error
            .map(|e| e.to_string())
            .unwrap_or_default();
        let mx_host = row
            .probe
            .as_ref()
            .and_then(|p| p.host.as_deref())
            .unwrap_or("");
        wtr.write_record([
            row.address.as_str(),
            if row.result.well_formed { "true" } else { "false" },
            bool_opt_str(row.result.valid_domain),
            bool_opt_str(row.result.valid_mailbox),
            check_error.as_str(),
            mx_host,
            row.dns_error.as_deref().unwrap_or(""),
        ])?;
    }
    let data = wtr.into_inner()?;
    write_or_print(out, &data)
}

#[cfg(not(feature = "with-csv"))]
fn emit_csv(_: &[VerificationReport], _: Option<&str>) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(feature = "with-serde")]
fn emit_mx_json(domain: &str, records: Result<Vec<MxRecord>, MxError>, out: Option<&str>) -> Result<()> {
    let payload = match records {
        Ok(records) => serde_json::json!({ "domain": domain, "records": records }),
        Err(err) => serde_json::json!({ "domain": domain, "error": err.to_string() }),
    };
    write_or_print(out, format!("{payload}\n").as_bytes())
}

#[cfg(not(feature = "with-serde"))]
fn emit_mx_json(_: &str, _: Result<Vec<MxRecord>, MxError>, _: Option<&str>) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn bool_opt_str(opt: Option<bool>) -> &'static str {
    match opt {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}

#[cfg(feature = "with-serde")]
fn write_or_print(out: Option<&str>, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    match out {
        Some(path) => write_all_atomically(path, bytes),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(feature = "with-serde")]
fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use anyhow::Context;
    use std::io::Write;
    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}
