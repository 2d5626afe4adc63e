use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use binday_core::model::{CouncilId, ResolvedAddress};

/// JSON shape printed by `lookup --address-only`.
#[derive(Debug, Serialize)]
pub(crate) struct AddressOutput<'a> {
    pub uprn: &'a str,
    pub address: &'a str,
    pub token: &'a str,
}

impl<'a> From<&'a ResolvedAddress> for AddressOutput<'a> {
    fn from(resolved: &'a ResolvedAddress) -> Self {
        Self {
            uprn: resolved.uprn(),
            address: resolved.address(),
            token: resolved.as_str(),
        }
    }
}

pub(crate) fn write_json<W: Write, T: Serialize>(
    mut out: W,
    value: &T,
    pretty: bool,
) -> Result<()> {
    let written = if pretty {
        serde_json::to_writer_pretty(&mut out, value)
    } else {
        serde_json::to_writer(&mut out, value)
    };
    written.context("Cannot write JSON output")?;
    writeln!(out).context("Cannot write JSON output")
}

pub(crate) fn write_councils<W: Write>(
    mut out: W,
    councils: &[(CouncilId, String)],
) -> Result<()> {
    for (id, name) in councils {
        writeln!(out, "{id}\t{name}").context("Cannot write council list")?;
    }
    Ok(())
}
