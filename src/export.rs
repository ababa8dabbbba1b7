use std::io::Write;

use thiserror::Error;

use crate::reader::SpcFile;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `x,y` rows.  Multi-spectrum files get a leading `spectrum` column,
/// even when they hold a single subfile.
pub fn write_csv<W: Write>(file: &SpcFile, writer: W) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_writer(writer);
    let multi = file.is_multifile();
    if multi {
        w.write_record(["spectrum", "x", "y"])?;
    } else {
        w.write_record(["x", "y"])?;
    }
    for (i, s) in file.spectra.iter().enumerate() {
        for (x, y) in s.x.iter().zip(&s.y) {
            if multi {
                w.write_record([i.to_string(), x.to_string(), y.to_string()])?;
            } else {
                w.write_record([x.to_string(), y.to_string()])?;
            }
        }
    }
    w.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_json(file: &SpcFile, pretty: bool) -> Result<String, ExportError> {
    Ok(if pretty {
        serde_json::to_string_pretty(file)?
    } else {
        serde_json::to_string(file)?
    })
}
