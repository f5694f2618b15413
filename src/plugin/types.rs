//! Common types for installed plugins

/// An installed plugin as the host lists it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Plugin file relative to the plugins directory (e.g., "akismet/akismet.php")
    pub file: String,
    /// Human readable name shown in reports
    pub name: String,
}

impl PluginInfo {
    pub fn new(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
        }
    }

    /// The registry identifier of this plugin
    pub fn slug(&self) -> &str {
        slug_from_plugin_file(&self.file)
    }
}

/// Extract the registry slug from a plugin file path.
///
/// The slug is the directory component, or the whole value for single-file
/// plugins (e.g., "hello.php").
pub fn slug_from_plugin_file(file: &str) -> &str {
    file.split('/').next().unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("akismet/akismet.php", "akismet")]
    #[case("wordpress-seo/wp-seo-main.php", "wordpress-seo")]
    #[case("hello.php", "hello.php")]
    #[case("classic-editor", "classic-editor")]
    #[case("a/b/c.php", "a")]
    fn slug_from_plugin_file_takes_first_path_component(
        #[case] file: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(slug_from_plugin_file(file), expected);
    }

    #[test]
    fn plugin_info_slug_uses_file() {
        let plugin = PluginInfo::new("akismet/akismet.php", "Akismet Anti-spam");
        assert_eq!(plugin.slug(), "akismet");
    }
}
