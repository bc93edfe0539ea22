//! A shell script that mimics the office engine's command line.
//!
//! The script understands `--version`, `--convert-to`, `--outdir` and
//! `-env:UserInstallation=file://...`, creates the profile directory the way
//! the real engine does, and appends every invocation to `engine-calls.log`
//! in the directory it was installed into.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::converter::shell_quote;

/// File the script appends its arguments to, one line per call.
pub const CALL_LOG: &str = "engine-calls.log";

/// File [`Behavior::HangWithHelper`] writes its helper's pid to.
pub const HELPER_PID: &str = "helper.pid";

/// How the fake engine responds to a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Writes `<outdir>/<stem>.<format>` and exits 0.
    Succeed,
    /// Sleeps, then behaves like [`Behavior::Succeed`].
    Delayed(Duration),
    /// Prints an error to stderr and exits with the given code.
    Fail(i32),
    /// Never finishes on its own.
    Hang,
    /// Forks a long-running helper, writes its pid to [`HELPER_PID`] and waits
    /// for it, the way the real launcher waits for its worker process.
    HangWithHelper,
    /// Exits 0 without writing anything.
    NoOutput,
}

impl Behavior {
    fn script_tail(&self) -> String {
        match self {
            Behavior::Succeed => SUCCEED.to_string(),
            Behavior::Delayed(delay) => {
                format!("sleep {:.3}\n{}", delay.as_secs_f64(), SUCCEED)
            }
            Behavior::Fail(code) => format!(
                "echo \"Error: source file could not be loaded\" >&2\nexit {}\n",
                code
            ),
            Behavior::Hang => "exec sleep 30\n".to_string(),
            Behavior::HangWithHelper => format!(
                "sleep 30 &\necho $! > \"$log_dir/{}\"\nwait\n",
                HELPER_PID
            ),
            Behavior::NoOutput => "exit 0\n".to_string(),
        }
    }
}

const PREAMBLE: &str = r#"if [ "$1" = "--version" ]; then
  echo "FakeOffice 7.6.4.1"
  exit 0
fi
echo "$@" >> "$log_dir/engine-calls.log"
target=""
outdir="."
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    --convert-to) target="$2"; shift 2; continue ;;
    --outdir) outdir="$2"; shift 2; continue ;;
    -env:UserInstallation=file://*) mkdir -p "${1#-env:UserInstallation=file://}/user" ;;
    -*) ;;
    *) src="$1" ;;
  esac
  shift
done
"#;

const SUCCEED: &str = r#"ext="${target%%:*}"
name="$(basename "$src")"
stem="${name%.*}"
out="$outdir/$stem.$ext"
printf '<html><body>%s</body></html>\n' "$(cat "$src" 2>/dev/null)" > "$out"
echo "convert $src -> $out"
exit 0
"#;

/// Writes an executable fake engine into `dir` and returns its path.
pub fn install(dir: &Path, behavior: Behavior) -> PathBuf {
    let path = dir.join("fake-soffice");
    let script = format!(
        "#!/bin/sh\nlog_dir={}\n{}{}",
        shell_quote(&dir.display().to_string()),
        PREAMBLE,
        behavior.script_tail()
    );
    std::fs::write(&path, script).expect("write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("make fake engine executable");
    path
}

/// Argument lines recorded by every conversion call of the engine in `dir`.
pub fn recorded_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join(CALL_LOG))
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
