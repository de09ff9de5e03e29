use crate::analyzer::metadata::{
    relative_key, relative_path, to_slash, ComponentReflectionInfo, DEFAULT_SOURCE_EXTENSIONS,
};
use crate::cache::{ReflectionCache, CACHE_VERSION};
use crate::error::GenerateError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Names and host-facing details of one generator run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// File extensions (without the dot) scanned under the source root.
    pub extensions: Vec<String>,
    pub cache_file_name: String,
    pub artifact_file_name: String,
    /// Host headers included ahead of the reflected sources.
    pub prelude_includes: Vec<String>,
    /// Host type each emitted metadata record is an instance of.
    pub record_type: String,
    pub cache_version: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            cache_file_name: "generated.cache".to_string(),
            artifact_file_name: "generated.cpp".to_string(),
            prelude_includes: vec![
                "Core/CoreInclude.hpp".to_string(),
                "ReflectionGenerator/ReflectionInfo.hpp".to_string(),
                "Scene/Scene.hpp".to_string(),
            ],
            record_type: "ReflectionGenerator::ComponentReflectionInfo".to_string(),
            cache_version: CACHE_VERSION.to_string(),
        }
    }
}

/// What a generation pass managed to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub artifact: Option<PathBuf>,
    pub cache_written: bool,
}

pub struct Generator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Emit the registration artifact into `output_dir`, then rewrite the
    /// cache. Failures are logged; a failed artifact does not stop the cache
    /// write.
    pub fn generate(
        &self,
        components: &[ComponentReflectionInfo],
        source_files: &[PathBuf],
        source_root: &Path,
        output_dir: &Path,
    ) -> GenerationOutcome {
        let artifact = match self.write_artifact(components, source_root, output_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                error!("{}", err);
                None
            }
        };

        let cache = ReflectionCache::new(
            output_dir.join(&self.config.cache_file_name),
            &self.config.cache_version,
        );
        let cache_written = match cache.serialize(components, source_files, source_root) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "Failed to generate cache file in {}: {}",
                    cache.path().display(),
                    err
                );
                false
            }
        };

        GenerationOutcome {
            artifact,
            cache_written,
        }
    }

    fn write_artifact(
        &self,
        components: &[ComponentReflectionInfo],
        source_root: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, GenerateError> {
        fs::create_dir_all(output_dir).map_err(|source| GenerateError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let path = output_dir.join(&self.config.artifact_file_name);
        let text = self.render(components, source_root, output_dir);
        fs::write(&path, text).map_err(|source| GenerateError::WriteArtifact {
            path: path.clone(),
            source,
        })?;
        info!("wrote {} components to {}", components.len(), path.display());
        Ok(path)
    }

    /// Source text of the registration module.
    pub fn render(
        &self,
        components: &[ComponentReflectionInfo],
        source_root: &Path,
        output_dir: &Path,
    ) -> String {
        let record_type = &self.config.record_type;
        let mut out = String::from("// Generated by reflectgen-core. Do not edit.\n");

        for include in &self.config.prelude_includes {
            out.push_str(&format!("#include \"{}\"\n", escape(include)));
        }
        let contributing: BTreeSet<&Path> = components.iter().map(|c| c.filepath.as_path()).collect();
        for file in contributing {
            let include = to_slash(&relative_path(file, output_dir));
            out.push_str(&format!("#include \"{}\"\n", escape(&include)));
        }
        out.push('\n');

        out.push_str("extern \"C\" {\n");
        out.push_str(&format!(
            "\tDLL_EXPORT std::vector<{record_type}>* GetComponents() {{\n"
        ));
        out.push_str(&format!(
            "\t\tstatic std::vector<{record_type}> s_Components = {{\n"
        ));
        for component in components {
            let name = &component.fullname;
            out.push_str("\t\t\t{\n");
            out.push_str(&format!("\t\t\t\t\"{}\",\n", escape(name)));
            out.push_str(&format!(
                "\t\t\t\t\"{}\",\n",
                escape(&relative_key(&component.filepath, source_root))
            ));
            out.push_str("\t\t\t\t{\n");
            for variable in &component.variables {
                out.push_str(&format!(
                    "\t\t\t\t\t{{ \"{}\", \"{}\", offsetof({name}, {}) }},\n",
                    escape(&variable.type_name),
                    escape(&variable.name),
                    variable.name
                ));
            }
            out.push_str("\t\t\t\t},\n");
            out.push_str(&format!("\t\t\t\tsizeof({name}),\n"));
            out.push_str(&format!(
                "\t\t\t\t[](void* _this) {{ std::construct_at(reinterpret_cast<{name}*>(_this)); }},\n"
            ));
            out.push_str(&format!(
                "\t\t\t\t[](void* _this) {{ std::destroy_at(reinterpret_cast<{name}*>(_this)); }},\n"
            ));
            out.push_str(&format!(
                "\t\t\t\t[](void* _this, void* other) {{ std::construct_at(reinterpret_cast<{name}*>(_this), *reinterpret_cast<{name}*>(other)); }}\n"
            ));
            out.push_str("\t\t\t},\n");
        }
        out.push_str("\t\t};\n");
        out.push_str("\t\treturn &s_Components;\n");
        out.push_str("\t}\n");

        out.push_str("\tDLL_EXPORT bool IsDebugConfiguration() {\n");
        out.push_str("#ifdef DEBUG\n\t\treturn true;\n#else\n\t\treturn false;\n#endif\n");
        out.push_str("\t}\n");
        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::metadata::VariableReflectionInfo;
    use tempfile::tempdir;

    fn sample(root: &Path) -> Vec<ComponentReflectionInfo> {
        vec![
            ComponentReflectionInfo {
                fullname: "ANamespace::Health".to_string(),
                filepath: root.join("src").join("Health.hpp"),
                variables: vec![
                    VariableReflectionInfo::new("float", "Current"),
                    VariableReflectionInfo::new("const char*", "Label"),
                ],
            },
            ComponentReflectionInfo {
                fullname: "Tag".to_string(),
                filepath: root.join("src").join("Health.hpp"),
                variables: vec![],
            },
        ]
    }

    #[test]
    fn render_lists_every_component_and_field() {
        let root = Path::new("/work");
        let config = GeneratorConfig::default();
        let text = Generator::new(&config).render(&sample(root), &root.join("src"), &root.join("generated"));

        assert!(text.contains("#include \"Core/CoreInclude.hpp\"\n"));
        assert_eq!(text.matches("#include \"../src/Health.hpp\"").count(), 1);
        assert!(text.contains("\"ANamespace::Health\",\n"));
        assert!(text.contains("\"Health.hpp\",\n"));
        assert!(text.contains("{ \"float\", \"Current\", offsetof(ANamespace::Health, Current) },"));
        assert!(text.contains("{ \"const char*\", \"Label\", offsetof(ANamespace::Health, Label) },"));
        assert!(text.contains("sizeof(ANamespace::Health),"));
        assert!(text.contains("std::destroy_at(reinterpret_cast<Tag*>(_this));"));
        assert!(text.contains("bool IsDebugConfiguration()"));
    }

    #[test]
    fn escapes_string_contents() {
        assert_eq!(escape(r#"a\b"c"#), r#"a\\b\"c"#);
    }

    #[test]
    fn generate_writes_artifact_and_cache() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        fs::create_dir(&src)?;
        fs::write(src.join("Health.hpp"), "")?;
        let out = dir.path().join("generated");

        let config = GeneratorConfig::default();
        let outcome = Generator::new(&config).generate(
            &sample(dir.path()),
            &[src.join("Health.hpp")],
            &src,
            &out,
        );

        assert_eq!(outcome.artifact, Some(out.join("generated.cpp")));
        assert!(outcome.cache_written);
        assert!(out.join("generated.cache").is_file());
        Ok(())
    }

    #[test]
    fn cache_is_written_even_if_artifact_fails() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("generated");
        // a directory squatting on the artifact path
        fs::create_dir_all(out.join("generated.cpp"))?;

        let config = GeneratorConfig::default();
        let outcome = Generator::new(&config).generate(&[], &[], dir.path(), &out);

        assert_eq!(outcome.artifact, None);
        assert!(outcome.cache_written);
        Ok(())
    }
}
