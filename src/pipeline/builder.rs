use super::orchestrator::Composer;
use marginalia_core::{ComposeError, ComposeOptions, DocumentComposer, LayoutTuning, RenderMode};
use marginalia_resource::FilesystemResourceProvider;
use marginalia_traits::ResourceProvider;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A builder for creating a [`Composer`].
#[derive(Debug, Default)]
pub struct ComposerBuilder {
    options: ComposeOptions,
    font_file: Option<PathBuf>,
    font_dir: Option<PathBuf>,
}

impl ComposerBuilder {
    /// Creates a builder with the default options (12pt Helvetica, plain text).
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces every option at once. Later `with_*` calls still apply on top.
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads options from a JSON file. Missing fields keep their defaults.
    pub fn with_options_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ComposeError> {
        self.options = serde_json::from_str(&read_config(path.as_ref())?)?;
        Ok(self)
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.options.font_size = font_size;
        self
    }

    pub fn with_line_spacing(mut self, line_spacing: f32) -> Self {
        self.options.line_spacing = line_spacing;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.options.render_mode = mode;
        self
    }

    pub fn with_column_padding(mut self, padding: f32) -> Self {
        self.options.column_padding = padding;
        self
    }

    pub fn with_right_ratio(mut self, ratio: f32) -> Self {
        self.options.right_ratio = ratio;
        self
    }

    /// Selects a built-in font by name, or a font looked up in the font
    /// directory. A path to an existing file is loaded like [`Self::with_font_file`].
    pub fn with_font(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if Path::new(&name).is_file() {
            self.font_file = Some(PathBuf::from(name));
        } else {
            self.font_file = None;
            self.options.font = Some(name);
        }
        self
    }

    /// Embeds the TrueType/OpenType font at `path`.
    pub fn with_font_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.font_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory searched for `<name>.ttf` and `<name>.otf` when the font is
    /// given by name.
    pub fn with_font_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.font_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_tuning(mut self, tuning: LayoutTuning) -> Self {
        self.options.tuning = tuning;
        self
    }

    /// Loads the layout tuning constants from a JSON file.
    pub fn with_tuning_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ComposeError> {
        self.options.tuning = serde_json::from_str(&read_config(path.as_ref())?)?;
        Ok(self)
    }

    /// Validates the options, resolves the font and creates the [`Composer`].
    pub fn build(mut self) -> Result<Composer, ComposeError> {
        let provider = match (self.font_file.take(), &self.font_dir) {
            (Some(file), _) => match FilesystemResourceProvider::for_file(&file) {
                Some((provider, name)) => {
                    self.options.font = Some(name);
                    Some(provider)
                }
                None => {
                    log::warn!("Font path '{}' has no file name, ignoring it", file.display());
                    None
                }
            },
            (None, Some(dir)) => Some(FilesystemResourceProvider::new(dir)),
            (None, None) => None,
        };
        let inner = DocumentComposer::new(
            self.options,
            provider.as_ref().map(|p| p as &dyn ResourceProvider),
        )?;
        log::debug!("Composer ready, font '{}'", inner.font().source.name());
        Ok(Composer::new(inner))
    }
}

fn read_config(path: &Path) -> Result<String, ComposeError> {
    fs::read_to_string(path).map_err(|e| {
        ComposeError::Io(io::Error::new(
            e.kind(),
            format!("Failed to read config from '{}': {}", path.display(), e),
        ))
    })
}
