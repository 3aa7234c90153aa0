use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "artifact_unzip_lambda";
const LAMBDA_BIN: &str = "unzip_lambda";
const DIST_DIR: &str = "infra/artifact_unzip/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the artifact-unzip pipeline stage",
    long_about = "Packages the Lambda, runs CI checks and produces sample\n\
                  pipeline artifacts for manual invocation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the Lambda binary and package it as a `bootstrap` zip
    Package {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Write a sample input artifact and CodePipeline job event
    SampleArtifact {
        /// Directory receiving `artifact.zip` and `event.json`
        #[arg(long, default_value = "target/sample-artifact")]
        output_dir: PathBuf,
        /// Destination bucket written into UserParameters
        #[arg(long, default_value = "dest-bucket")]
        bucket: String,
        /// Destination key prefix written into UserParameters
        #[arg(long, default_value = "builds/42")]
        key_prefix: String,
        /// Optional SNS topic for the completion notification
        #[arg(long)]
        topic_arn: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Debug build of the Lambda package
    Package,
    /// Run check + package
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) {
    eprintln!("+ cargo {}", args.join(" "));
    let status: ExitStatus = Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo");
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_lambda(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build artifact-unzip lambda binary");
    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BIN,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(binary_name(LAMBDA_BIN, target));
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join("unzip_lambda.zip");
    let binary = fs::read(&binary_path)
        .unwrap_or_else(|error| panic!("expected lambda binary at '{}': {error}", binary_path.display()));
    write_zip(
        &zip_path,
        &[("bootstrap", binary.as_slice())],
        Some(0o755),
    );

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!("warning: could not query rustup targets ({error}); skipping preflight");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "rust target `{target}` is not installed. run `rustup target add {target}` and retry `cargo run -p xtask -- package`"
        );
    }
}

/// The AWS SDK TLS stack compiles C code, so cross builds from Windows need a
/// Linux C toolchain.
fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let configured = [
        format!("CC_{}", target.replace('-', "_")),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ]
    .into_iter()
    .filter_map(|key| std::env::var(key).ok())
    .any(|value| tool_works(value.trim()));

    if !configured && !tool_works("x86_64-linux-gnu-gcc") {
        panic!(
            "missing C cross-compiler for `{target}`. install x86_64-linux-gnu-gcc or set CC_x86_64_unknown_linux_gnu before packaging."
        );
    }
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };

    Command::new(bin)
        .args(parts)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn write_zip(zip_path: &Path, entries: &[(&str, &[u8])], unix_mode: Option<u32>) {
    let file = fs::File::create(zip_path).expect("failed to create zip file");
    let mut zip = ZipWriter::new(file);
    let mut options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    if let Some(mode) = unix_mode {
        options = options.unix_permissions(mode);
    }

    for (name, body) in entries {
        zip.start_file(*name, options)
            .unwrap_or_else(|error| panic!("failed to start zip entry '{name}': {error}"));
        zip.write_all(body)
            .unwrap_or_else(|error| panic!("failed to write zip entry '{name}': {error}"));
    }
    zip.finish().expect("failed to finish zip file");
}

// ── sample artifact ────────────────────────────────────────────────

fn write_sample_artifact(output_dir: &Path, bucket: &str, key_prefix: &str, topic_arn: Option<&str>) {
    fs::create_dir_all(output_dir).expect("failed to create sample output directory");

    let zip_path = output_dir.join("artifact.zip");
    write_zip(
        &zip_path,
        &[
            ("app.bin", b"\x7fELF sample binary".as_slice()),
            ("README.md", b"# Sample build output\n".as_slice()),
            ("config/settings.json", br#"{"feature_flags":[]}"#.as_slice()),
        ],
        None,
    );

    let mut user_parameters = json!({
        "bucket": bucket,
        "key_prefix": key_prefix,
    });
    if let Some(arn) = topic_arn {
        user_parameters["notification_sns_topic_arn"] = json!(arn);
    }

    let event = json!({
        "CodePipeline.job": {
            "id": "00000000-0000-0000-0000-000000000000",
            "accountId": "000000000000",
            "data": {
                "actionConfiguration": {
                    "configuration": {
                        "FunctionName": LAMBDA_BIN,
                        "UserParameters": user_parameters.to_string(),
                    }
                },
                "inputArtifacts": [{
                    "name": "BuildOutput",
                    "revision": null,
                    "location": {
                        "type": "S3",
                        "s3Location": {
                            "bucketName": "REPLACE_WITH_ARTIFACT_BUCKET",
                            "objectKey": "REPLACE_WITH_ARTIFACT_KEY"
                        }
                    }
                }],
                "outputArtifacts": [],
                "artifactCredentials": {
                    "accessKeyId": "REPLACE",
                    "secretAccessKey": "REPLACE",
                    "sessionToken": "REPLACE"
                }
            }
        }
    });
    let event_path = output_dir.join("event.json");
    let body = serde_json::to_string_pretty(&event).expect("sample event should serialize");
    fs::write(&event_path, body).expect("failed to write sample event");

    eprintln!(
        "Sample files:\n- {}\n- {}",
        zip_path.display(),
        event_path.display()
    );
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test artifact_unzip_core");
    run_cargo(&["test", "-p", "artifact_unzip_core"]);

    step("Test artifact_unzip_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn ci_package() {
    step("Build lambda binary (debug)");
    run_cargo(&["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_BIN]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Package => ci_package(),
                CiJob::All => {
                    ci_check();
                    ci_package();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package { target, profile } => package_lambda(&target, profile),
        Commands::SampleArtifact {
            output_dir,
            bucket,
            key_prefix,
            topic_arn,
        } => write_sample_artifact(&output_dir, &bucket, &key_prefix, topic_arn.as_deref()),
    }
}
