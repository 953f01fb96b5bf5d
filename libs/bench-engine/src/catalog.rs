use std::collections::BTreeMap;
use std::path::Path;

use codec_avro::AvroCodec;

use crate::error::EngineError;

pub const KEY_SCHEMA_FILE: &str = "key-schema.avsc";
pub const VALUE_SCHEMA_FILE: &str = "value-schema.avsc";

/// Key and value schemas of one topic.
///
/// Both schemas share a namespace equal to the topic name; `load` refuses
/// to build a pair that breaks this.
#[derive(Debug, Clone)]
pub struct TopicSchemaPair {
    topic: String,
    key: AvroCodec,
    value: AvroCodec,
}

impl TopicSchemaPair {
    /// Load `key-schema.avsc` and `value-schema.avsc` from `dir` and check
    /// their namespaces against `topic`.
    pub fn load(dir: &Path, topic: &str) -> Result<Self, EngineError> {
        let load = |file: &str| {
            AvroCodec::from_file(&dir.join(file)).map_err(|source| EngineError::Schema {
                topic: topic.to_string(),
                source,
            })
        };
        Self::new(topic, load(KEY_SCHEMA_FILE)?, load(VALUE_SCHEMA_FILE)?)
    }

    pub fn new(topic: &str, key: AvroCodec, value: AvroCodec) -> Result<Self, EngineError> {
        let key_ns = key.namespace();
        let value_ns = value.namespace();
        if key_ns != value_ns || key_ns != Some(topic) {
            return Err(EngineError::SchemaMismatch {
                topic: topic.to_string(),
                key_namespace: key_ns.unwrap_or("<none>").to_string(),
                value_namespace: value_ns.unwrap_or("<none>").to_string(),
            });
        }
        Ok(Self {
            topic: topic.to_string(),
            key,
            value,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn key(&self) -> &AvroCodec {
        &self.key
    }

    pub fn value(&self) -> &AvroCodec {
        &self.value
    }
}

/// All topics discovered under a schema root directory.
///
/// Layout: one subdirectory per topic, named after the topic, each holding
/// a key and a value schema. Other entries of the root are ignored.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    topics: BTreeMap<String, TopicSchemaPair>,
}

impl SchemaCatalog {
    /// Discover and validate every topic under `root`.
    ///
    /// Any unreadable schema or namespace mismatch fails the whole catalog.
    pub fn load(root: &Path) -> Result<Self, EngineError> {
        let entries = std::fs::read_dir(root).map_err(|e| {
            EngineError::Config(format!("schema directory '{}': {e}", root.display()))
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let topic = entry.file_name().into_string().map_err(|name| {
                EngineError::Config(format!("topic directory name is not UTF-8: {name:?}"))
            })?;
            dirs.push((topic, entry.path()));
        }
        dirs.sort();

        let mut topics = BTreeMap::new();
        for (topic, dir) in dirs {
            let pair = TopicSchemaPair::load(&dir, &topic)?;
            tracing::info!(topic = %topic, dir = %dir.display(), "loaded topic schemas");
            topics.insert(topic, pair);
        }

        Ok(Self { topics })
    }

    pub fn insert(&mut self, pair: TopicSchemaPair) {
        self.topics.insert(pair.topic.clone(), pair);
    }

    pub fn get(&self, topic: &str) -> Option<&TopicSchemaPair> {
        self.topics.get(topic)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub(crate) fn into_topics(self) -> impl Iterator<Item = TopicSchemaPair> {
        self.topics.into_values()
    }
}
