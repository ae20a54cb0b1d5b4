use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use clap::{crate_version, App, Arg, ArgMatches};
use log::info;

use indir::config::{check_attribute_name, Config, DEFAULT_CONFIG};
use indir::files::FileReader;
use indir::indir::{IndirIncludeProcessor, PlainIncludeProcessor};
use indir::preprocess::Preprocessor;
use indir::Fallible;
use indir_lib::{IncludeProcessor, INDIR_VERSION};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    std::process::exit(match run() {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            1
        }
    });
}

fn run() -> Fallible {
    let long_version = format!("{} (extension API {})", crate_version!(), INDIR_VERSION);
    let app = App::new("indir")
        .version(crate_version!())
        .long_version(long_version.as_str())
        .about("Include preprocessor for AsciiDoc-style documents.\n\
                Expands includes and keeps the attribute 'indir' pointing at the directory\n\
                of the document currently processed.")
        .arg(Arg::with_name("config")
            .short("c")
            .long("config")
            .value_name("config_file")
            .help("Sets the config file name")
            .takes_value(true)
            .default_value(DEFAULT_CONFIG))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .value_name("out_dir")
            .help("Directory to write expanded documents to. If none is specified, uses 'paths' -> 'output' from config file, or prints to STDOUT.")
            .takes_value(true))
        .arg(Arg::with_name("attribute")
            .short("a")
            .long("attribute")
            .value_name("name=value")
            .help("Sets a document attribute. Can be given multiple times.")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1))
        .arg(Arg::with_name("plain")
            .long("plain")
            .help("Expands includes without maintaining the 'indir' attribute.")
            .takes_value(false))
        .arg(Arg::with_name("input")
            .help("The root document(s) as glob pattern(s). If none are specified, uses 'paths' -> 'files' from config file.")
            .value_name("input")
            .multiple(true)
            .index(1));

    let matches = app.get_matches();
    let config = read_config(&matches)?;

    let input_patterns = config.paths.files.as_ref().ok_or(
        "No inputs provided via arguments or toml file. For help, use:\n\
               > indir -h",
    )?;

    let base = env::current_dir()?;
    let mut any_input = false;
    for pattern in input_patterns {
        let paths = glob::glob(pattern)
            .map_err(|err| format!("Unable to process glob pattern \"{}\": {}", pattern, err))?;

        for path in paths {
            let input = path.map_err(|err| {
                format!("Unable to process glob pattern \"{}\": {}", pattern, err)
            })?;

            if input.is_file() {
                any_input = true;
                let (lines, newline) = process_document(&config, &input).map_err(|err| {
                    format!(
                        "Failed to process document \"{}\": {}",
                        input.display(),
                        err
                    )
                })?;
                write_document(
                    &lines,
                    newline,
                    &input,
                    config.paths.output.as_deref(),
                    &base,
                )?;
            }
        }
    }

    if !any_input {
        return Err(format!(
            "No input files found in patterns: {}\n\
                For help, use:\n\
                 > indir -h",
            input_patterns.join(", ")
        )
        .into());
    }

    Ok(())
}

/// Reads the config file and applies command line overrides
fn read_config(matches: &ArgMatches) -> Fallible<Config> {
    let config_path = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);

    let mut config = if matches.occurrences_of("config") == 0 && !Path::new(config_path).exists() {
        Config::default()
    } else {
        Config::read(config_path)
            .map_err(|err| format!("Could not read config file \"{}\": {}", config_path, err))?
    };

    if let Some(dir) = matches.value_of("output") {
        config.paths.output = Some(PathBuf::from(dir));
    }
    if let Some(patterns) = matches.values_of("input") {
        config.paths.files = Some(patterns.map(|pattern| pattern.to_owned()).collect());
    }
    if matches.is_present("plain") {
        config.include.plain = true;
    }
    if let Some(attributes) = matches.values_of("attribute") {
        for attribute in attributes {
            let (name, value) = attribute.split_once('=').unwrap_or((attribute, ""));
            check_attribute_name(name)?;
            config.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    config
        .check()
        .map_err(|err| format!("Invalid config file \"{}\": {}", config_path, err))?;

    Ok(config)
}

/// Expands a root document. Returns the lines and the root document's line terminator
fn process_document(config: &Config, file: &Path) -> Fallible<(Vec<String>, &'static str)> {
    info!("Processing document {}", file.display());

    let reader = Box::new(FileReader::new());
    let processor: Box<dyn IncludeProcessor> = if config.include.plain {
        Box::new(PlainIncludeProcessor::new(reader))
    } else {
        Box::new(IndirIncludeProcessor::new(reader))
    };

    let mut pre = Preprocessor::new(processor)
        .with_max_depth(config.include.max_depth)
        .with_attributes(config.attributes.clone());
    let lines = pre.process_file(file)?;
    Ok((lines, pre.newline()))
}

fn write_document(
    lines: &[String],
    newline: &str,
    file: &Path,
    output: Option<&Path>,
    base: &Path,
) -> Fallible {
    let mut text = lines.join(newline);
    text.push_str(newline);

    match output {
        Some(dir) => {
            let path = output_path(dir, file, base)?;
            if is_same_file(&path, file) {
                return Err(format!(
                    "Refusing to overwrite input document \"{}\" with its expansion",
                    file.display()
                )
                .into());
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            info!("Writing expanded document {}", path.display());
            fs::write(&path, text)?;
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Places a document below the output directory, at its path relative to `base`.
/// Only plain path components are accepted, so the result never leaves `dir`.
fn output_path(dir: &Path, file: &Path, base: &Path) -> Fallible<PathBuf> {
    let outside = || {
        format!(
            "Document \"{}\" is outside of \"{}\", unable to place it in output directory \"{}\"",
            file.display(),
            base.display(),
            dir.display()
        )
    };

    let relative = if file.is_absolute() {
        file.strip_prefix(base).map_err(|_| outside())?
    } else {
        file
    };

    let mut path = dir.to_path_buf();
    let mut any_part = false;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                any_part = true;
            }
            Component::CurDir => {}
            _ => return Err(outside().into()),
        }
    }

    if !any_part {
        return Err(format!("Invalid document path \"{}\"", file.display()).into());
    }
    Ok(path)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
