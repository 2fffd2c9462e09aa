//! Writer and encoder factories, keyed by configuration type name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::appender::console::{ConsoleWriter, Target};
use crate::appender::file::FileWriter;
use crate::appender::{Appender, AppenderError, AppenderSet, WriteSyncer};
use crate::config::schema::AppenderConfig;
use crate::encoder::{ConsoleEncoder, Encoder, JsonEncoder};

pub type WriterFactory =
    Arc<dyn Fn(&AppenderConfig) -> Result<Arc<dyn WriteSyncer>, AppenderError> + Send + Sync>;
pub type EncoderFactory =
    Arc<dyn Fn(&AppenderConfig) -> Result<Arc<dyn Encoder>, AppenderError> + Send + Sync>;

/// Builds appender generations from configuration.
///
/// `Default` registers the `console` and `file` writers and the `json` and
/// `console` encoders. Custom sinks are added with [`register_writer`].
///
/// [`register_writer`]: AppenderRegistry::register_writer
#[derive(Clone)]
pub struct AppenderRegistry {
    writers: HashMap<String, WriterFactory>,
    encoders: HashMap<String, EncoderFactory>,
}

impl AppenderRegistry {
    /// A registry with no types registered.
    pub fn empty() -> Self {
        Self {
            writers: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    pub fn register_writer<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<(), AppenderError>
    where
        F: Fn(&AppenderConfig) -> Result<Arc<dyn WriteSyncer>, AppenderError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.writers.contains_key(&kind) {
            return Err(AppenderError::Duplicate { kind: "writer", name: kind });
        }
        self.writers.insert(kind, Arc::new(factory));
        Ok(())
    }

    pub fn register_encoder<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<(), AppenderError>
    where
        F: Fn(&AppenderConfig) -> Result<Arc<dyn Encoder>, AppenderError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.encoders.contains_key(&kind) {
            return Err(AppenderError::Duplicate { kind: "encoder", name: kind });
        }
        self.encoders.insert(kind, Arc::new(factory));
        Ok(())
    }

    pub fn has_writer(&self, kind: &str) -> bool {
        self.writers.contains_key(kind)
    }

    pub fn has_encoder(&self, kind: &str) -> bool {
        self.encoders.contains_key(kind)
    }

    /// Build a single appender. The encoder is resolved first so an unknown
    /// encoder never leaves a half-opened writer behind.
    pub fn create_appender(&self, config: &AppenderConfig) -> Result<Appender, AppenderError> {
        let encoder_factory = self
            .encoders
            .get(&config.encoder.kind)
            .ok_or_else(|| AppenderError::UnknownEncoder(config.encoder.kind.clone()))?;
        let writer_factory = self
            .writers
            .get(&config.kind)
            .ok_or_else(|| AppenderError::UnknownType(config.kind.clone()))?;

        let encoder = encoder_factory(config)?;
        let writer = writer_factory(config)?;
        Ok(Appender::new(config.name.as_str(), writer, encoder))
    }

    /// Build a fresh generation. Nothing is shared with any live generation.
    pub fn build(&self, configs: &[AppenderConfig]) -> Result<AppenderSet, AppenderError> {
        let appenders = configs
            .iter()
            .map(|config| self.create_appender(config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AppenderSet::new(appenders))
    }
}

impl Default for AppenderRegistry {
    fn default() -> Self {
        let mut writers: HashMap<String, WriterFactory> = HashMap::new();
        writers.insert("console".into(), Arc::new(console_writer));
        writers.insert("file".into(), Arc::new(file_writer));

        let mut encoders: HashMap<String, EncoderFactory> = HashMap::new();
        encoders.insert("json".into(), Arc::new(json_encoder));
        encoders.insert("console".into(), Arc::new(console_encoder));

        Self { writers, encoders }
    }
}

impl fmt::Debug for AppenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writers: Vec<_> = self.writers.keys().collect();
        writers.sort();
        let mut encoders: Vec<_> = self.encoders.keys().collect();
        encoders.sort();
        f.debug_struct("AppenderRegistry")
            .field("writers", &writers)
            .field("encoders", &encoders)
            .finish()
    }
}

fn console_writer(config: &AppenderConfig) -> Result<Arc<dyn WriteSyncer>, AppenderError> {
    let target = match config.option_str("target") {
        Some(target) => target.parse::<Target>().map_err(|reason| AppenderError::InvalidOption {
            appender: config.name.clone(),
            reason,
        })?,
        None => Target::default(),
    };
    Ok(Arc::new(ConsoleWriter::new(target)))
}

fn file_writer(config: &AppenderConfig) -> Result<Arc<dyn WriteSyncer>, AppenderError> {
    let path = config
        .option_str("file_name")
        .ok_or_else(|| AppenderError::InvalidOption {
            appender: config.name.clone(),
            reason: "`file_name` is required".into(),
        })?;
    let writer = FileWriter::open(path).map_err(|source| AppenderError::Io {
        appender: config.name.clone(),
        source,
    })?;
    Ok(Arc::new(writer))
}

fn json_encoder(_config: &AppenderConfig) -> Result<Arc<dyn Encoder>, AppenderError> {
    Ok(Arc::new(JsonEncoder::new()))
}

fn console_encoder(config: &AppenderConfig) -> Result<Arc<dyn Encoder>, AppenderError> {
    let encoder = match config.encoder.option_str("time_format") {
        Some(format) => ConsoleEncoder::with_time_format(format),
        None => ConsoleEncoder::new(),
    };
    Ok(Arc::new(encoder))
}
