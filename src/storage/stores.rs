use super::*;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::sync::Mutex;

/// Records kept as a JSON array in a single file.
pub struct JsonStorage<T> {
    pub medium: String,
    pub path: String,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonStorage<T> {
    pub fn new(path: &str) -> Self {
        Self {
            medium: "json".to_string(),
            path: path.to_string(),
            _records: PhantomData,
        }
    }
}

impl<T> RecordStore<T> for JsonStorage<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<T>, AppError> {
        if !fs::exists(Path::new(&self.path))? {
            return Ok(Vec::new());
        }
        let mut file = OpenOptions::new().read(true).open(&self.path)?;

        let mut data = String::new();
        file.read_to_string(&mut data)?;

        // serde_json will give an error if data is empty
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&data)?;

        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else if let Some(items) = value.get("items") {
            // A saved listing response from the REST backend
            Ok(serde_json::from_value(items.clone())?)
        } else {
            Err(AppError::Validation(format!(
                "Invalid JSON structure in {}: expected an array of records",
                self.path
            )))
        }
    }

    fn save(&self, records: &[T]) -> Result<(), AppError> {
        let path = Path::new(&self.path);
        if !path.exists() {
            create_file_parent(&self.path)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let json = serde_json::to_string_pretty(records)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}

/// Process-local records, for tests and throwaway sessions.
pub struct MemStorage<T> {
    pub medium: String,
    data: Mutex<Vec<T>>,
}

impl<T> MemStorage<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            medium: "mem".to_string(),
            data: Mutex::new(records),
        }
    }
}

impl<T> Default for MemStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordStore<T> for MemStorage<T>
where
    T: Clone + Send,
{
    fn load(&self) -> Result<Vec<T>, AppError> {
        Ok(self.data.lock()?.clone())
    }

    fn save(&self, records: &[T]) -> Result<(), AppError> {
        *self.data.lock()? = records.to_vec();
        Ok(())
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}
