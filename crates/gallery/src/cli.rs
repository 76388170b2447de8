use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "shader-gallery",
    author,
    version,
    about = "Interactive GPU shader gallery",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Catalog id of the shader to show first.
    #[arg(long, value_name = "ID")]
    pub shader: Option<String>,

    /// Load shaders from a gallery manifest instead of the built-in catalog.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "1280x720"
    )]
    pub size: (u32, u32),

    /// Start with the fps overlay enabled.
    #[arg(long)]
    pub overlay: bool,

    /// List the available shaders and exit.
    #[arg(long)]
    pub list: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in `{value}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in `{value}`"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got `{value}`"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let cli = Cli::try_parse_from(["shader-gallery"]).unwrap();
        assert_eq!(cli.size, (1280, 720));
        assert!(cli.shader.is_none());
        assert!(!cli.overlay);
        assert!(!cli.list);
    }

    #[test]
    fn size_parses_width_and_height() {
        let cli = Cli::try_parse_from(["shader-gallery", "--size", "1920x1080"]).unwrap();
        assert_eq!(cli.size, (1920, 1080));
    }

    #[test]
    fn malformed_size_is_rejected() {
        assert!(Cli::try_parse_from(["shader-gallery", "--size", "1920"]).is_err());
        assert!(Cli::try_parse_from(["shader-gallery", "--size", "0x720"]).is_err());
        assert!(Cli::try_parse_from(["shader-gallery", "--size", "axb"]).is_err());
    }

    #[test]
    fn shader_and_manifest_flags_parse() {
        let cli = Cli::try_parse_from([
            "shader-gallery",
            "--shader",
            "plasma",
            "--manifest",
            "gallery.toml",
            "--overlay",
        ])
        .unwrap();
        assert_eq!(cli.shader.as_deref(), Some("plasma"));
        assert_eq!(cli.manifest.as_deref(), Some(std::path::Path::new("gallery.toml")));
        assert!(cli.overlay);
    }
}
