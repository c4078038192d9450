use std::fs;

use predicates::prelude::*;

use super::common::{TestEnv, file_name};

#[test]
fn dev_install_dispatches_build_script() {
  let env = TestEnv::new();

  env
    .impforge_cmd()
    .args(["--dev-mode", "--nproc", "4"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Install complete (development mode)"));

  let out = env.out_dir();
  let log = env.tool_log();
  let builds: Vec<&str> = log
    .lines()
    .filter(|l| l.starts_with("bash ") && !l.ends_with("--version"))
    .collect();
  assert_eq!(builds.len(), 1);
  assert!(builds[0].ends_with(&format!("impenv {} \"\" 4", out.display())));

  assert!(log.contains("git clone https://github.com/tanmoy7989/imp.git"));
  assert!(log.contains("git submodule update --init"));
  assert!(log.contains("python3 setup_git.py"));
  assert!(log.contains(&format!("conda env create -f {}", out.join("impenv.yml").display())));

  assert_eq!(env.build_logs().len(), 1);
  let rendered = fs::read_to_string(out.join("impenv.yml")).unwrap();
  assert!(rendered.starts_with("name: impenv\n"));

  let rebuild: Vec<_> = fs::read_dir(&out)
    .unwrap()
    .map(|e| e.unwrap().path())
    .filter(|p| file_name(p).starts_with("make_imp_"))
    .collect();
  assert_eq!(rebuild.len(), 1);
  assert!(fs::read_to_string(&rebuild[0]).unwrap().contains("make -j4\n"));

  let bashrc = fs::read_to_string(env.home().join(".bashrc")).unwrap();
  assert!(bashrc.contains("# added by impforge"));
  assert!(bashrc.contains(&out.join("impforge-env.sh").display().to_string()));
}

#[test]
fn minimal_install_passes_heavy_modules() {
  let env = TestEnv::new();

  env
    .impforge_cmd()
    .args(["--dev-mode", "--minimal-install", "-d", "em2d"])
    .assert()
    .success();

  let log = env.tool_log();
  let build = log
    .lines()
    .find(|l| l.starts_with("bash ") && !l.ends_with("--version"))
    .unwrap();
  let disabled = build.split_whitespace().nth(4).unwrap();
  let mut modules: Vec<&str> = disabled.split(':').collect();
  modules.sort();
  assert_eq!(
    modules,
    vec!["em2d", "foxs", "membrane", "multifit", "npc", "saxs_merge", "spb"]
  );
}

#[test]
fn production_install_skips_build() {
  let env = TestEnv::new();

  env
    .impforge_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Install complete (production mode)"));

  let log = env.tool_log();
  assert!(!log.contains("bash"));
  assert!(!log.contains("python3"));
  assert!(!log.contains("tanmoy7989/imp.git"));
  assert!(log.contains("git clone https://github.com/tanmoy7989/PMI_analysis.git"));
  assert_eq!(env.build_logs().len(), 1);
}

#[test]
fn json_report_lists_stages() {
  let env = TestEnv::new();

  let output = env
    .impforge_cmd()
    .args(["--dev-mode", "--output", "json", "--no-profile"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["success"], true);
  assert_eq!(value["exit_code"], 0);
  let stages: Vec<&str> = value["report"]["stages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s.as_str().unwrap())
    .collect();
  assert_eq!(stages.first(), Some(&"init"));
  assert_eq!(stages.last(), Some(&"done"));
  assert!(stages.contains(&"build_dispatched"));
  assert!(!stages.contains(&"shell_profile_updated"));
  assert!(!env.home().join(".bashrc").exists());
}

#[test]
fn failed_build_exits_with_build_code() {
  let env = TestEnv::new();
  env.fail_build();

  env
    .impforge_cmd()
    .arg("--dev-mode")
    .assert()
    .failure()
    .code(22)
    .stderr(predicate::str::contains("building IMP failed"));

  let logs = env.build_logs();
  assert_eq!(logs.len(), 1);
  let log = fs::read_to_string(&logs[0]).unwrap();
  assert!(log.contains(">>success=False"));
  assert!(log.contains(">>failure=building IMP: build script"));
  assert!(log.contains("exit code 2"));
  assert!(!env.home().join(".bashrc").exists());
}

#[test]
fn failed_build_tolerated_with_continue_on_error() {
  let env = TestEnv::new();
  env.fail_build();

  env
    .impforge_cmd()
    .args(["--dev-mode", "--continue-on-error"])
    .assert()
    .failure()
    .code(22)
    .stdout(predicate::str::contains("Rebuild script"));

  assert_eq!(env.build_logs().len(), 1);
  assert!(!env.home().join(".bashrc").exists());
}

#[test]
fn missing_template_exits_with_template_code() {
  let env = TestEnv::new();
  fs::remove_file(env.path("impenv.yml.template")).unwrap();

  env
    .impforge_cmd()
    .assert()
    .failure()
    .code(13)
    .stderr(predicate::str::contains("environment template not found"));

  assert_eq!(env.build_logs().len(), 1);
}

#[test]
fn malformed_template_exits_with_template_code() {
  let env = TestEnv::new();
  env.write_file("impenv.yml.template", "name: fixed\n");

  env.impforge_cmd().assert().failure().code(14);
}

#[test]
fn confirm_refuses_without_terminal() {
  let env = TestEnv::new();

  env
    .impforge_cmd()
    .args(["--dev-mode", "--confirm"])
    .assert()
    .failure()
    .code(30)
    .stderr(predicate::str::contains("non-interactive"));

  let log = env.tool_log();
  assert!(!log.lines().any(|l| l.starts_with("bash ") && !l.ends_with("--version")));
}

#[test]
fn rerun_leaves_shell_profile_unchanged() {
  let env = TestEnv::new();

  env.impforge_cmd().assert().success();
  let first = fs::read_to_string(env.home().join(".bashrc")).unwrap();

  env
    .impforge_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("(unchanged)"));
  let second = fs::read_to_string(env.home().join(".bashrc")).unwrap();

  assert_eq!(first, second);
  assert_eq!(second.matches("# added by impforge").count(), 1);
}

#[test]
fn environment_variables_configure_the_run() {
  let env = TestEnv::new();

  env
    .impforge_cmd()
    .env("IMPFORGE_ENV_NAME", "myenv")
    .env("IMPFORGE_NO_PROFILE", "true")
    .assert()
    .success();

  let rendered = fs::read_to_string(env.out_dir().join("impenv.yml")).unwrap();
  assert!(rendered.starts_with("name: myenv\n"));
  assert!(!env.home().join(".bashrc").exists());
}
