//! The evaluation track format: one `<onset> <offset> <label>` line per
//! segment, times in seconds with six decimals.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::{Error, Result, Segment};

pub fn write_lab<W: Write>(segments: &[Segment], mut w: W) -> Result<()> {
    for s in segments {
        writeln!(w, "{:.6} {:.6} {}", s.onset, s.offset, s.label)?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_lab<P: AsRef<Path>>(segments: &[Segment], path: P) -> Result<()> {
    write_lab(segments, BufWriter::new(File::create(path)?))
}

pub fn read_lab<R: BufRead>(r: R) -> Result<Vec<Segment>> {
    let mut out = Vec::new();

    for (i, line) in r.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let bad = |message: String| Error::Lab {
            line: i + 1,
            message,
        };

        let mut fields = line.split_whitespace();
        let (onset, offset, label) = match (fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return Err(bad("expected <onset> <offset> <label>".into())),
        };
        if fields.next().is_some() {
            return Err(bad("trailing fields after label".into()));
        }

        let onset: f64 = onset
            .parse()
            .map_err(|e| bad(format!("onset {:?}: {}", onset, e)))?;
        let offset: f64 = offset
            .parse()
            .map_err(|e| bad(format!("offset {:?}: {}", offset, e)))?;
        if offset < onset {
            return Err(bad(format!("offset {} before onset {}", offset, onset)));
        }
        out.push(Segment::new(label, onset, offset));
    }

    Ok(out)
}

pub fn load_lab<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
    read_lab(BufReader::new(File::open(path)?))
}
