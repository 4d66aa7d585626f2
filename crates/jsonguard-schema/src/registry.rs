use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;

const SCHEMA_FILE_SUFFIX: &str = ".schema.json";
const DIRECTORY_SCHEMA_VERSION: &str = "1";

/// A schema registry the policy can look schemas up in.
#[async_trait]
pub trait SchemaRegistryResource: Send + Sync {
    /// Returns `Ok(None)` when no schema is registered under `name`.
    async fn get_schema(&self, name: &str) -> Result<Option<Arc<Schema>>>;
}

/// Named resources available to the policy.
pub trait ResourceManager: Send + Sync {
    /// Look up a schema registry resource by its configured name.
    fn schema_registry(&self, name: &str) -> Option<Arc<dyn SchemaRegistryResource>>;
}

/// Subject-keyed registry held in memory.
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
    config: RegistryConfig,
}

impl InMemorySchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: HashMap::new(),
            config,
        }
    }

    /// Register a schema under its subject.
    pub fn register(&mut self, schema: Schema) {
        self.schemas
            .insert(schema.subject().to_string(), Arc::new(schema));
    }

    /// Register raw schema content for a subject.
    ///
    /// Content is stored as-is; it is only parsed when a payload is validated.
    pub fn register_content(&mut self, subject: &str, content: impl Into<String>) {
        self.register(Schema::new(
            subject,
            subject,
            DIRECTORY_SCHEMA_VERSION,
            content,
        ));
    }

    /// Load `<subject>.schema.json` files from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded_schema_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let is_schema_file = file_name.ends_with(SCHEMA_FILE_SUFFIX);
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                if is_schema_file {
                    return Err(SchemaError::LoadFailed(format!(
                        "refusing to load schema symlink: {file_name}"
                    )));
                }
                continue;
            }
            if !file_type.is_file() || !is_schema_file {
                continue;
            }

            let subject = match subject_from_file_name(&file_name) {
                Some(subject) => subject,
                None => {
                    return Err(SchemaError::LoadFailed(format!(
                        "schema file has no subject: {file_name}"
                    )));
                }
            };

            loaded_schema_count = loaded_schema_count.saturating_add(1);
            if loaded_schema_count > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    registry.config.max_schemas_from_directory, loaded_schema_count
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                SchemaError::LoadFailed(format!(
                    "failed opening schema {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(SchemaError::LoadFailed(format!(
                        "schema file changed during load: {file_name}"
                    )));
                }
            }

            if opened_metadata.len() > registry.config.max_schema_file_size as u64 {
                return Err(SchemaError::LoadFailed(format!(
                    "schema file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let max_bytes = registry.config.max_schema_file_size;
            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    SchemaError::LoadFailed(format!(
                        "failed reading schema {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(SchemaError::LoadFailed(format!(
                    "schema file too large while reading: {file_name}"
                )));
            }

            tracing::debug!(subject = %subject, bytes = content.len(), "loaded registry schema");
            registry.register_content(&subject, content);
        }

        Ok(registry)
    }

    /// Look up a schema synchronously.
    pub fn get(&self, subject: &str) -> Option<Arc<Schema>> {
        self.schemas.get(subject).cloned()
    }

    /// Subjects with a registered schema, sorted.
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.schemas.keys().cloned().collect();
        subjects.sort_unstable();
        subjects
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

#[async_trait]
impl SchemaRegistryResource for InMemorySchemaRegistry {
    async fn get_schema(&self, name: &str) -> Result<Option<Arc<Schema>>> {
        Ok(self.get(name))
    }
}

/// Name-keyed resource table.
#[derive(Default, Clone)]
pub struct ResourceMap {
    registries: HashMap<String, Arc<dyn SchemaRegistryResource>>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema registry under a resource name.
    pub fn with_registry(
        mut self,
        name: impl Into<String>,
        registry: Arc<dyn SchemaRegistryResource>,
    ) -> Self {
        self.registries.insert(name.into(), registry);
        self
    }
}

impl ResourceManager for ResourceMap {
    fn schema_registry(&self, name: &str) -> Option<Arc<dyn SchemaRegistryResource>> {
        self.registries.get(name).cloned()
    }
}

impl std::fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.registries.keys().collect();
        names.sort_unstable();
        f.debug_struct("ResourceMap")
            .field("registries", &names)
            .finish()
    }
}

fn subject_from_file_name(file_name: &str) -> Option<String> {
    let subject = file_name.strip_suffix(SCHEMA_FILE_SUFFIX)?;
    if subject.is_empty() {
        return None;
    }
    Some(subject.to_string())
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const PERSON_SCHEMA: &str = r#"{
        "type": "object",
        "properties": { "name": { "type": "string" } },
        "required": ["name"]
    }"#;

    #[tokio::test]
    async fn register_and_lookup() {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register_content("person", PERSON_SCHEMA);

        let schema = registry.get_schema("person").await.unwrap().unwrap();
        assert_eq!(schema.subject(), "person");
        assert_eq!(schema.content(), PERSON_SCHEMA);
        assert!(registry.get_schema("missing").await.unwrap().is_none());
    }

    #[test]
    fn resource_map_lookup() {
        let registry: Arc<dyn SchemaRegistryResource> = Arc::new(InMemorySchemaRegistry::new());
        let resources = ResourceMap::new().with_registry("registry", registry);

        assert!(resources.schema_registry("registry").is_some());
        assert!(resources.schema_registry("other").is_none());
    }

    #[test]
    fn from_directory_loads_subjects() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "person.schema.json", PERSON_SCHEMA);
        write_schema(&dir, "orders-value.schema.json", r#"{"type":"array"}"#);
        write_schema(&dir, "notes.txt", "ignored");

        let registry = InMemorySchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(
            registry.subjects(),
            vec!["orders-value".to_string(), "person".to_string()]
        );
        assert_eq!(registry.get("person").unwrap().version(), "1");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_schema_without_subject_is_rejected() {
        let dir = make_temp_schema_dir("no-subject");
        write_schema(&dir, ".schema.json", PERSON_SCHEMA);

        let result = InMemorySchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_fails() {
        let dir = std::env::temp_dir().join(format!("jsonguard-missing-{}", std::process::id()));
        assert!(matches!(
            InMemorySchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink-schema");
        let target = dir.join("target.json");
        std::fs::write(&target, PERSON_SCHEMA.as_bytes()).unwrap();
        let link = dir.join("person.schema.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let result = InMemorySchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_count_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-count-limit");
        write_schema(&dir, "a.schema.json", PERSON_SCHEMA);
        write_schema(&dir, "b.schema.json", PERSON_SCHEMA);

        let config = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        let result = InMemorySchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_file_size_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-size-limit");
        write_schema(&dir, "person.schema.json", PERSON_SCHEMA);

        let config = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        let result = InMemorySchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn subject_parsing() {
        assert_eq!(
            subject_from_file_name("orders-value.schema.json"),
            Some("orders-value".to_string())
        );
        assert_eq!(subject_from_file_name(".schema.json"), None);
        assert_eq!(subject_from_file_name("orders.json"), None);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "jsonguard-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        let path = dir.join(file_name);
        std::fs::write(path, contents.as_bytes()).unwrap();
    }
}
