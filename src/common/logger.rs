use csv::Writer;
use std::error::Error;
use std::ffi::OsStr;
use std::path::PathBuf;

// Logger for policy diagnostics and any other named scalars a caller
// wants to keep per iteration
pub trait Logger {
    // log a piece of data
    fn log(&mut self, data: LogItem);

    // dump everything logged so far
    fn dump(&self) -> Result<(), Box<dyn Error>>;

    // check whether logging is possible. If try_to_fix, the
    // Logger will try to resolve the issue, e.g. by creating
    // the missing directory
    fn check_can_log(&self, try_to_fix: bool) -> Result<(), &str>;

    fn print_last(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogData {
    String(String),
    Float(f32),
    Int(i32),
}

impl LogData {
    fn to_field(&self) -> String {
        match self {
            LogData::String(s) => s.clone(),
            LogData::Float(f) => f.to_string(),
            LogData::Int(i) => i.to_string(),
        }
    }
}

/// Named values kept in insertion order. Pushing an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogItem {
    items: Vec<(String, LogData)>,
}

impl LogItem {
    pub fn push(mut self, k: String, v: LogData) -> Self {
        self.insert(k, v);

        self
    }

    pub fn insert(&mut self, k: String, v: LogData) {
        match self.items.iter_mut().find(|(key, _)| *key == k) {
            Some((_, old)) => *old = v,
            None => self.items.push((k, v)),
        }
    }

    pub fn get(&self, k: &str) -> Option<&LogData> {
        self.items.iter().find(|(key, _)| key == k).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn print(&self) {
        for (k, v) in &self.items {
            println!("{}: {:?}", k, v);
        }
    }

    pub fn combine(&mut self, other: LogItem) {
        other.items.into_iter().for_each(|(k, v)| {
            self.insert(k, v);
        });
    }
}

pub struct CsvLogger {
    overwrite: bool,
    dump_path: PathBuf,
    to_stdout: bool,
    keys: Vec<String>,
    data: Vec<LogItem>,
}

impl CsvLogger {
    pub fn new(dump_path: PathBuf, to_stdout: bool, overwrite: bool) -> Self {
        Self {
            dump_path,
            to_stdout,
            data: Vec::new(),
            keys: Vec::new(),
            overwrite,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Logger for CsvLogger {
    fn log(&mut self, data: LogItem) {
        if self.to_stdout {
            println!("{:?}", data);
        }

        // empty diagnostics are the default, nothing to record
        if data.is_empty() {
            return;
        }

        for key in data.keys() {
            if !self.keys.iter().any(|k| k == key) {
                self.keys.push(key.to_string());
            }
        }

        self.data.push(data);
    }

    fn dump(&self) -> Result<(), Box<dyn Error>> {
        println!(
            "Dumping logs to {:?}. {} items to dump",
            self.dump_path,
            self.data.len()
        );

        let mut wtr = Writer::from_path(&self.dump_path)?;

        // columns in first-seen order
        wtr.write_record(&self.keys)?;

        for record in &self.data {
            let row: Vec<String> = self
                .keys
                .iter()
                .map(|k| record.get(k).map(LogData::to_field).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }

        wtr.flush()?;

        Ok(())
    }

    fn check_can_log(&self, try_to_fix: bool) -> Result<(), &str> {
        let parent = match self.dump_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if self.dump_path.exists() && !self.overwrite {
            Err("logger dump file already exists")
        } else if self.dump_path.extension() != Some(OsStr::new("csv")) {
            Err("logger dump path should be a csv")
        } else if !parent.exists() {
            if try_to_fix {
                match std::fs::create_dir_all(&parent) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Couldn't create directory"),
                }
            } else {
                Err("logger dump path dir does not exist")
            }
        } else {
            Ok(())
        }
    }

    fn print_last(&self) {
        println!("Last Log:");
        if let Some(log) = self.data.last() {
            for (key, record) in &log.items {
                println!("\t{key}: {:#?}", record);
            }
        }
    }
}
