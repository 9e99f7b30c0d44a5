use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserOptions,
    #[serde(default)]
    pub render: RenderOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserOptions {
    /// Deepest element nesting accepted before the parse is aborted.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Reject `</name>` whose name differs from the element it closes.
    #[serde(default)]
    pub strict_closing_tags: bool,
    /// Most nodes one parse may build, spliced block copies included.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            strict_closing_tags: false,
            max_nodes: default_max_nodes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

fn default_max_depth() -> usize {
    512
}

fn default_max_nodes() -> usize {
    1_000_000
}

fn default_indent() -> usize {
    2
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}
