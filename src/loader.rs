use byteorder::{BigEndian, ReadBytesExt};
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Read an object stream: big-endian 16-bit words, the first being the load
/// address.
pub fn read_object<R: Read>(reader: R) -> Result<Vec<u16>, io::Error> {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        match reader.read_u16::<BigEndian>() {
            Ok(value) => {
                buffer.push(value);
            }
            Err(e) => {
                return if e.kind() == io::ErrorKind::UnexpectedEof {
                    Ok(buffer)
                } else {
                    Err(e)
                };
            }
        }
    }
}

pub fn read_object_file<P: AsRef<Path>>(path: P) -> Result<Vec<u16>, io::Error> {
    read_object(fs::File::open(path)?)
}

/// Parse a symbol listing. Everything up to and including the separator line
/// (third token of twelve hyphens) is header; each following line carries an
/// ignored column, a label, and a hex address. The first malformed line ends
/// the listing.
pub fn read_symbols<R: BufRead>(reader: R) -> Result<Vec<(String, u16)>, io::Error> {
    let mut symbols = Vec::new();
    let mut adding = false;

    for line in reader.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();

        if !adding {
            if tokens.nth(2) == Some("------------") {
                adding = true;
            }
            continue;
        }

        let entry = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(_), Some(name), Some(addr)) => {
                match u16::from_str_radix(addr, 16) {
                    Ok(addr) => (name.to_string(), addr),
                    Err(_) => break,
                }
            }
            _ => break,
        };
        symbols.push(entry);
    }

    Ok(symbols)
}

pub fn read_symbol_file<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u16)>, io::Error> {
    read_symbols(BufReader::new(fs::File::open(path)?))
}
