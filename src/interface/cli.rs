use std::ffi::OsString;
use std::path::PathBuf;

use clap::{App, ArgMatches};

use crate::window::WindowConfig;

/// Everything `main` needs, pulled out of the command line.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub window: WindowConfig,
    /// The `--log` filter, if one was given.
    pub log_filter: Option<String>,
    pub demo: DemoKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemoKind {
    Cube,
    Texture { image: Option<PathBuf> },
    Traced { image: Option<PathBuf>, level: log::Level },
    Profile { trace_out: PathBuf },
    Pulling { image: Option<PathBuf>, shaders: PathBuf },
    Cubemap { hdr: PathBuf, snapshot: PathBuf },
}

impl DemoKind {
    pub fn name(&self) -> &'static str {
        match self {
            DemoKind::Cube => "cube",
            DemoKind::Texture { .. } => "texture",
            DemoKind::Traced { .. } => "traced",
            DemoKind::Profile { .. } => "profile",
            DemoKind::Pulling { .. } => "pulling",
            DemoKind::Cubemap { .. } => "cubemap",
        }
    }

    /// The level OpenGL calls are traced at, for the demos that trace them.
    pub fn trace_level(&self) -> Option<log::Level> {
        match self {
            DemoKind::Traced { level, .. } => Some(*level),
            _ => None,
        }
    }
}

pub fn parse_from<I, T>(args: I) -> clap::Result<DemoConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let yaml = load_yaml!("cli.yaml");
    let matches = App::from_yaml(yaml).get_matches_from_safe(args)?;

    let width = value_t!(matches, "width", u32)?;
    let height = value_t!(matches, "height", u32)?;
    if width == 0 || height == 0 {
        return Err(clap::Error::with_description(
            &format!("the window cannot be {}x{} pixels", width, height),
            clap::ErrorKind::InvalidValue,
        ));
    }

    let demo = match matches.subcommand() {
        ("cube", _) => DemoKind::Cube,
        ("texture", Some(sub)) => DemoKind::Texture { image: path_of(sub, "image") },
        ("traced", Some(sub)) => DemoKind::Traced {
            image: path_of(sub, "image"),
            level: value_t!(sub, "trace-level", log::Level)?,
        },
        ("profile", Some(sub)) => DemoKind::Profile { trace_out: path_or(sub, "trace-out", "trace.json") },
        ("pulling", Some(sub)) => DemoKind::Pulling {
            image: path_of(sub, "image"),
            shaders: path_or(sub, "shaders", "shaders"),
        },
        ("cubemap", Some(sub)) => DemoKind::Cubemap {
            hdr: path_or(sub, "hdr", ""),
            snapshot: path_or(sub, "snapshot", "screenshot.hdr"),
        },
        (other, _) => {
            return Err(clap::Error::with_description(
                &format!("unknown subcommand `{}`", other),
                clap::ErrorKind::UnrecognizedSubcommand,
            ))
        }
    };

    let log_filter = matches.value_of("log").map(String::from);

    let window = WindowConfig {
        title: format!("glsteps: {}", demo.name()),
        width,
        height,
        vsync: !matches.is_present("no-vsync"),
    };

    Ok(DemoConfig { window, log_filter, demo })
}

fn path_of(matches: &ArgMatches<'_>, name: &str) -> Option<PathBuf> {
    matches.value_of_os(name).map(PathBuf::from)
}

fn path_or(matches: &ArgMatches<'_>, name: &str, default: &str) -> PathBuf {
    path_of(matches, name).unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> clap::Result<DemoConfig> {
        parse_from(std::iter::once("glsteps").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_for_the_cube() {
        let config = parse(&["cube"]).unwrap();
        assert_eq!(config.demo, DemoKind::Cube);
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert!(config.window.vsync);
        assert_eq!(config.window.title, "glsteps: cube");
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn window_options_come_before_the_subcommand() {
        let config = parse(&["--width", "640", "--height", "480", "--no-vsync", "--log", "warn", "texture"]).unwrap();
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert!(!config.window.vsync);
        assert_eq!(config.log_filter.as_deref(), Some("warn"));
        assert_eq!(config.demo, DemoKind::Texture { image: None });
    }

    #[test]
    fn traced_carries_its_level_and_image() {
        let config = parse(&["--log", "info", "traced", "--image", "duck.png", "--trace-level", "info"]).unwrap();
        assert_eq!(
            config.demo,
            DemoKind::Traced { image: Some(PathBuf::from("duck.png")), level: log::Level::Info }
        );
        assert_eq!(config.log_filter.as_deref(), Some("info"));
        assert_eq!(config.demo.trace_level(), Some(log::Level::Info));
    }

    #[test]
    fn traced_without_a_filter_leaves_the_default_to_logging() {
        let config = parse(&["traced"]).unwrap();
        assert_eq!(config.log_filter, None);
        assert_eq!(config.demo.trace_level(), Some(log::Level::Debug));
        assert_eq!(DemoKind::Cube.trace_level(), None);
    }

    #[test]
    fn profile_writes_its_trace_where_asked() {
        let config = parse(&["profile"]).unwrap();
        assert_eq!(config.demo, DemoKind::Profile { trace_out: PathBuf::from("trace.json") });

        let config = parse(&["profile", "--trace-out", "out/frames.json"]).unwrap();
        assert_eq!(config.demo, DemoKind::Profile { trace_out: PathBuf::from("out/frames.json") });
        assert_eq!(config.window.title, "glsteps: profile");
    }

    #[test]
    fn empty_windows_are_rejected() {
        let err = parse(&["--width", "0", "cube"]).unwrap_err();
        assert_eq!(err.kind, clap::ErrorKind::InvalidValue);
        assert!(parse(&["--height", "0", "cube"]).is_err());
        assert!(parse(&["--width", "1", "--height", "1", "cube"]).is_ok());
    }

    #[test]
    fn traced_rejects_unknown_levels() {
        assert!(parse(&["traced", "--trace-level", "loud"]).is_err());
    }

    #[test]
    fn cubemap_requires_an_hdr_image() {
        assert!(parse(&["cubemap"]).is_err());

        let config = parse(&["cubemap", "--hdr", "sky.hdr"]).unwrap();
        assert_eq!(
            config.demo,
            DemoKind::Cubemap {
                hdr: PathBuf::from("sky.hdr"),
                snapshot: PathBuf::from("screenshot.hdr"),
            }
        );
    }

    #[test]
    fn pulling_reads_shaders_from_the_given_directory() {
        let config = parse(&["pulling", "--shaders", "assets/glsl"]).unwrap();
        assert_eq!(config.demo, DemoKind::Pulling { image: None, shaders: PathBuf::from("assets/glsl") });
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--width", "abc", "cube"]).is_err());
    }
}
