//! ptm-fit: fit a Polynomial Texture Map from a light-position file.
//!
//! Usage:
//!   ptm-fit -i lights.lp -o out.ptm [-BIVARIATE|-UNIVARIATE] [-cache]
//!           [-crop LEFT TOP WIDTH HEIGHT]
//!
//! Run without arguments to be prompted interactively.

use ptm_rs::io::images::Crop;
use ptm_rs::{Basis, FitConfig, Fitter};
use std::io::Write;
use std::path::PathBuf;

fn usage(program: &str) {
    println!("{} usage:", program);
    println!("  -i <file.lp>");
    println!("     Light-position file listing input photos and light directions.");
    println!("  -o <file.ptm> | -PTM <file.ptm>");
    println!("     Output file name.");
    println!("  -BIVARIATE | -UNIVARIATE");
    println!("  -b <basis>   (0 = biquadratic, 1 = univariate; default 0)");
    println!("     Least-squares fit in two independent variables or one.");
    println!("  -crop LEFT TOP WIDTH HEIGHT");
    println!("     Only process part of the input frames, in tenths of a percent.");
    println!("  -cache");
    println!("     Keep the computed coefficients in memory (needs lots of it).");
    println!("  -version");
    println!("     Print the software version.");
    println!("  -h");
    println!("     List command line options.");
}

fn prompt(question: &str) -> String {
    println!("{}", question);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return String::new();
    }
    answer.trim().to_string()
}

struct Args {
    lp_file: PathBuf,
    output: Option<PathBuf>,
    config: FitConfig,
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut lp_file: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut config = FitConfig::default();

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("missing value for {}", name))
        };

        match arg.as_str() {
            "-i" => lp_file = Some(PathBuf::from(value("-i")?)),
            "-o" | "-PTM" => output = Some(PathBuf::from(value(arg.as_str())?)),
            "-BIVARIATE" => config.basis = Basis::QuadraticBivariate,
            "-UNIVARIATE" => config.basis = Basis::QuadraticUnivariate,
            "-b" => {
                let code: i32 = value("-b")?
                    .parse()
                    .map_err(|_| "basis must be 0 or 1".to_string())?;
                config.basis = Basis::from_code(code).map_err(|e| e.to_string())?;
            }
            // Other fitters take these; accept and ignore them.
            "-rgb" | "-lrgb" => {}
            "-cache" => config.cache = true,
            "-crop" => {
                let mut take = |name| -> Result<u32, String> {
                    value(name)?
                        .parse::<u32>()
                        .map_err(|_| format!("bad {} value", name))
                };
                config.crop = Crop {
                    left: take("-crop LEFT")?,
                    top: take("-crop TOP")?,
                    width: take("-crop WIDTH")?,
                    height: take("-crop HEIGHT")?,
                };
            }
            "-version" => println!("ptm-fit version {}", ptm_rs::VERSION),
            "-h" | "/?" => {
                usage("ptm-fit");
                std::process::exit(0);
            }
            other => return Err(format!("error in parameter list: {}", other)),
        }
    }

    let lp_file = lp_file.ok_or_else(|| "-i option must be specified".to_string())?;
    Ok(Args {
        lp_file,
        output,
        config,
    })
}

fn prompt_args() -> Args {
    let lp_file = PathBuf::from(prompt("Enter filename for lp file (light positions file)"));

    let answer = prompt(
        "Enter basis (polynomials)\n\
         0 = quadratic in two variables, 1 = quadratic in 1 variable",
    );
    let basis = match answer.parse::<i32>().ok().and_then(|c| Basis::from_code(c).ok()) {
        Some(basis) => basis,
        None => {
            println!("Wrong input; assume the default (quadratic)");
            Basis::QuadraticBivariate
        }
    };

    Args {
        lp_file,
        output: None,
        config: FitConfig {
            basis,
            ..FitConfig::default()
        },
    }
}

fn main() {
    println!("ptm-fit v{} — Polynomial Texture Map fitter", ptm_rs::VERSION);

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = if argv.is_empty() {
        prompt_args()
    } else {
        match parse_args(&argv) {
            Ok(args) => args,
            Err(message) => {
                eprintln!("{}", message);
                usage("ptm-fit");
                std::process::exit(2);
            }
        }
    };

    let fitter = Fitter::new(args.config);
    let fitted = match fitter.fit(&args.lp_file) {
        Ok(fitted) => fitted,
        Err(err) => {
            eprintln!("error in fitting PTM: {}", err);
            std::process::exit(1);
        }
    };
    println!("computation done!");

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(prompt("Enter filename for output PTM file:")));

    println!("writing file to: {}", output.display());
    if let Err(err) = fitted.write(&output) {
        eprintln!("error writing file: {}", err);
        std::process::exit(1);
    }
}
