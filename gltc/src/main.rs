use docopt::Docopt;
use glt::{translate, FeatureLevel, ShaderStage, TranslateOptions};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::process;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const USAGE: &'static str = "
GLSL ES to HLSL Translator

Usage:
  gltc (--vertex | --fragment) [options] <source-file>
  gltc --help

Options:
  -h --help                        Show help.
  --vertex                         Translate a vertex shader.
  --fragment                       Translate a fragment shader.
  -o --output <output_file>        Output file.
  --feature-level <feature_level>  Target feature level: 9_1, 9_3, 10_0, 10_1 or 11_0 [default: 10_0].
  --fl9                            Restrict output to feature level 9.
  --no-inputs                      Do not write the entry point wrapper.
  --no-boilerplate                 Only write helper functions the shader uses.
  --derivatives                    Allow GL_OES_standard_derivatives.
  --frag-depth                     Allow GL_EXT_frag_depth.
  --bindings                       Print the shader interface after the HLSL.
  -v --verbose                     Log each translation stage.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_vertex: bool,
    flag_fragment: bool,
    flag_output: Option<String>,
    flag_feature_level: String,
    flag_fl9: bool,
    flag_no_inputs: bool,
    flag_no_boilerplate: bool,
    flag_derivatives: bool,
    flag_frag_depth: bool,
    flag_bindings: bool,
    flag_verbose: bool,
    arg_source_file: String,
}

fn parse_feature_level(name: &str) -> Option<FeatureLevel> {
    Some(match name {
        "9_1" => FeatureLevel::Level9_1,
        "9_3" => FeatureLevel::Level9_3,
        "10_0" => FeatureLevel::Level10_0,
        "10_1" => FeatureLevel::Level10_1,
        "11_0" => FeatureLevel::Level11_0,
        _ => return None,
    })
}

fn options_from_args(args: &Args) -> TranslateOptions {
    let mut options = TranslateOptions::empty();
    options.set(TranslateOptions::DISABLE_WRITE_INPUTS, args.flag_no_inputs);
    options.set(TranslateOptions::DISABLE_BOILERPLATE, args.flag_no_boilerplate);
    options.set(TranslateOptions::ENABLE_STANDARD_DERIVATIVES, args.flag_derivatives);
    options.set(TranslateOptions::ENABLE_FRAG_DEPTH, args.flag_frag_depth);
    options.set(TranslateOptions::FORCE_FEATURE_LEVEL_9, args.flag_fl9);
    options
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let args: Args = Docopt::new(USAGE).and_then(|d| d.deserialize()).unwrap_or_else(|e| e.exit());
    init_logging(args.flag_verbose);

    let stage = if args.flag_fragment { ShaderStage::Fragment } else { ShaderStage::Vertex };
    debug!(?stage, vertex = args.flag_vertex, "selected stage");

    let feature_level = match parse_feature_level(&args.flag_feature_level) {
        Some(level) => level,
        None => {
            println!("Unknown feature level '{}'", args.flag_feature_level);
            process::exit(1);
        }
    };

    let mut source_file = match File::open(&args.arg_source_file) {
        Ok(file) => file,
        Err(_) => {
            println!("Failed to load file '{}'", &args.arg_source_file);
            process::exit(1);
        }
    };

    let mut source_contents = String::new();
    if let Err(err) = source_file.read_to_string(&mut source_contents) {
        error!(%err, "read failed");
        println!("Failed to read file '{}'", &args.arg_source_file);
        process::exit(1);
    }

    let shader = translate(&source_contents, stage, options_from_args(&args), feature_level);
    if !shader.is_success() {
        for diagnostic in &shader.diagnostics {
            println!("{}", diagnostic);
        }
        process::exit(1);
    }

    let mut output = shader.hlsl;
    if args.flag_bindings {
        for binding in &shader.bindings {
            output.push_str(&format!("// {:?} {} {} : {} ({})\n",
                                     binding.kind,
                                     binding.binding_type,
                                     binding.name,
                                     binding.register,
                                     binding.hlsl_name));
        }
    }

    match args.flag_output {
        Some(output_file) => {
            let mut file = match File::create(&output_file) {
                Ok(file) => file,
                Err(_) => {
                    println!("Failed to open output file {}", output_file);
                    process::exit(1);
                }
            };
            if file.write_all(output.as_bytes()).is_err() {
                println!("Failed to write to output file");
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}

#[test]
fn test_parse_args() {
    let argv = ["gltc", "--fragment", "--no-inputs", "--feature-level", "9_3", "shader.frag"];
    let args: Args = Docopt::new(USAGE).and_then(|d| d.argv(argv.iter()).deserialize()).unwrap();
    assert!(args.flag_fragment);
    assert_eq!(args.arg_source_file, "shader.frag");
    assert_eq!(parse_feature_level(&args.flag_feature_level), Some(FeatureLevel::Level9_3));
    assert_eq!(options_from_args(&args), TranslateOptions::DISABLE_WRITE_INPUTS);
    assert_eq!(parse_feature_level("12_0"), None);
}
