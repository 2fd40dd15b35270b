use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};
use ltcday_core::config::{
    DEFAULT_BIT_DEPTH, DEFAULT_FRAME_RATE, DEFAULT_SAMPLE_RATE, DEFAULT_SEGMENT_MINUTES,
    DEFAULT_START,
};
use ltcday_core::wav::DEFAULT_VOLUME_DBFS;

/// Parse a frame rate such as `25` or `29.97`.
pub fn parse_frame_rate(value: &str) -> Result<f64, String> {
    let fps = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err("frame rate must be greater than zero".into());
    }
    Ok(fps)
}

/// Parse a level in dBFS, which must not exceed full scale.
pub fn parse_volume(value: &str) -> Result<f64, String> {
    let dbfs = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid volume '{value}'"))?;
    if !dbfs.is_finite() || dbfs > 0.0 {
        return Err("volume must be at most 0 dBFS".into());
    }
    Ok(dbfs)
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Generate a full day of segmented LTC reference audio")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("fps")
                .short('f')
                .long("fps")
                .value_name("RATE")
                .help("Frame rate of the timecode (e.g. 25, 29.97)")
                .allow_hyphen_values(true)
                .default_value(DEFAULT_FRAME_RATE.to_string())
                .value_parser(parse_frame_rate),
        )
        .arg(
            Arg::new("start")
                .short('s')
                .long("start")
                .value_name("HH:MM:SS:FF")
                .help("Timecode of the first segment; seconds and frames are ignored")
                .default_value(DEFAULT_START),
        )
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("MINUTES")
                .help("Length of each segment in minutes (1-1440)")
                .default_value(DEFAULT_SEGMENT_MINUTES.to_string())
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("rate")
                .short('r')
                .long("rate")
                .value_name("HZ")
                .help("Sample rate of the generated audio (44100 or 48000)")
                .default_value(DEFAULT_SAMPLE_RATE.to_string())
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("bits")
                .short('b')
                .long("bits")
                .value_name("BITS")
                .help("Bit depth of the generated audio (8, 16, or 24)")
                .default_value(DEFAULT_BIT_DEPTH.to_string())
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Existing directory where the segments will be written")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("volume")
                .long("volume")
                .value_name("DBFS")
                .help("Signal level of the built-in encoder in dBFS")
                .allow_hyphen_values(true)
                .default_value(DEFAULT_VOLUME_DBFS.to_string())
                .value_parser(parse_volume),
        )
        .arg(
            Arg::new("encoder-command")
                .long("encoder-command")
                .value_name("PROGRAM")
                .help("Render each segment with an external program instead of the built-in encoder")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("encoder-arg")
                .long("encoder-arg")
                .value_name("ARG")
                .help("Argument passed to the external encoder before the segment options")
                .allow_hyphen_values(true)
                .action(ArgAction::Append)
                .requires("encoder-command"),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .help("Read every written file back and check its format and length")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the generated segments without writing files")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frame_rate_accepts_fractional_rates() {
        assert_eq!(parse_frame_rate("29.97").unwrap(), 29.97);
        assert_eq!(parse_frame_rate(" 25 ").unwrap(), 25.0);
    }

    #[test]
    fn parse_frame_rate_rejects_non_positive_and_garbage() {
        assert!(parse_frame_rate("0").is_err());
        assert!(parse_frame_rate("-24").is_err());
        assert!(parse_frame_rate("fast").is_err());
        assert!(parse_frame_rate("inf").is_err());
    }

    #[test]
    fn parse_volume_caps_at_full_scale() {
        assert_eq!(parse_volume("-18").unwrap(), -18.0);
        assert!(parse_volume("3").is_err());
    }

    #[test]
    fn defaults_match_operator_form() {
        let matches = build_cli().get_matches_from(["ltcday"]);
        assert_eq!(matches.get_one::<f64>("fps"), Some(&29.97));
        assert_eq!(
            matches.get_one::<String>("start").map(String::as_str),
            Some("00:00:00:00")
        );
        assert_eq!(matches.get_one::<u32>("length"), Some(&10));
        assert_eq!(matches.get_one::<u32>("rate"), Some(&44_100));
        assert_eq!(matches.get_one::<u16>("bits"), Some(&16));
        assert_eq!(matches.get_one::<f64>("volume"), Some(&-3.0));
    }

    #[test]
    fn encoder_args_require_a_command() {
        let result = build_cli().try_get_matches_from(["ltcday", "--encoder-arg", "x"]);
        assert!(result.is_err());

        let matches = build_cli()
            .try_get_matches_from([
                "ltcday",
                "--encoder-command",
                "python",
                "--encoder-arg",
                "generate_ltc.py",
            ])
            .unwrap();
        let args: Vec<_> = matches
            .get_many::<String>("encoder-arg")
            .unwrap()
            .collect();
        assert_eq!(args, ["generate_ltc.py"]);
    }
}
