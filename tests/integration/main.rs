//! Integration tests for coursier-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn coursier_cache() -> Command {
        let mut cmd = cargo_bin_cmd!("coursier-cache");
        cmd.env_remove("GITHUB_JOB")
            .env_remove("GITHUB_ACTIONS")
            .env_remove("INPUT_PATH")
            .env_remove("INPUT_MATRIX");
        cmd
    }

    /// Command running against a project, store and state file inside `dir`
    fn in_project(dir: &Path, state: &str, subcommand: &str) -> Command {
        let mut cmd = coursier_cache();
        cmd.arg(subcommand)
            .arg("--root")
            .arg(dir.join("project"))
            .arg("--host")
            .arg("file")
            .arg("--state-file")
            .arg(dir.join(state))
            .arg("--store-dir")
            .arg(dir.join("store"));
        if subcommand == "restore" {
            cmd.arg("--path").arg(dir.join("coursier"));
        }
        cmd
    }

    fn state_json(dir: &Path, state: &str) -> serde_json::Value {
        let content = fs::read_to_string(dir.join(state)).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn setup_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("project")).unwrap();
        fs::write(dir.path().join("project/deps.txt"), "org.typelevel:cats-core:2.12.0").unwrap();
        dir
    }

    #[test]
    fn help_displays() {
        coursier_cache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependency cache keys, restore and save"))
            .stdout(predicate::str::contains("restore"))
            .stdout(predicate::str::contains("save"));
    }

    #[test]
    fn version_displays() {
        coursier_cache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("coursier-cache"));
    }

    #[test]
    fn restore_save_restore_cycle() {
        let dir = setup_project();
        let root = dir.path();

        in_project(root, "job1.json", "restore")
            .assert()
            .success()
            .stdout(predicate::str::contains("coursier cache not found"));
        let state = state_json(root, "job1.json");
        assert_eq!(state["outputs"]["cache-hit-coursier"], "false");
        assert_eq!(state["state"]["COURSIER_CACHE_RESULT"], "");
        assert_eq!(
            state["env"]["COURSIER_CACHE"],
            &*root.join("coursier").to_string_lossy()
        );

        fs::create_dir_all(root.join("coursier/v1")).unwrap();
        fs::write(root.join("coursier/v1/cats-core.jar"), "jar").unwrap();

        in_project(root, "job1.json", "save")
            .assert()
            .success()
            .stdout(predicate::str::contains("coursier cache saved with key"));

        fs::remove_dir_all(root.join("coursier")).unwrap();

        in_project(root, "job2.json", "restore")
            .assert()
            .success()
            .stdout(predicate::str::contains("coursier cache restored from key"));
        let state = state_json(root, "job2.json");
        assert_eq!(state["outputs"]["cache-hit-coursier"], "true");
        assert_eq!(
            fs::read_to_string(root.join("coursier/v1/cats-core.jar")).unwrap(),
            "jar"
        );

        in_project(root, "job2.json", "save")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache hit occurred on the primary key"));
    }

    #[test]
    fn changed_build_files_restore_from_fallback() {
        let dir = setup_project();
        let root = dir.path();

        in_project(root, "job1.json", "restore").assert().success();
        fs::create_dir_all(root.join("coursier")).unwrap();
        fs::write(root.join("coursier/index"), "old").unwrap();
        in_project(root, "job1.json", "save").assert().success();

        in_project(root, "job2.json", "restore")
            .arg("--extra-files")
            .arg(root.join("project/deps.txt"))
            .arg("--extra-hashed-content")
            .arg("jdk21")
            .assert()
            .success()
            .stdout(predicate::str::contains("restored from fallback key"));

        let state = state_json(root, "job2.json");
        assert_eq!(state["outputs"]["cache-hit-coursier"], "false");
    }

    #[test]
    fn save_without_restore_succeeds() {
        let dir = setup_project();
        in_project(dir.path(), "never-restored.json", "save")
            .assert()
            .success();
    }

    #[test]
    fn save_with_corrupt_state_still_succeeds() {
        let dir = setup_project();
        fs::write(dir.path().join("corrupt.json"), "{not json").unwrap();
        in_project(dir.path(), "corrupt.json", "save")
            .assert()
            .success();
    }

    #[test]
    fn save_with_empty_root_input_succeeds() {
        let dir = setup_project();
        coursier_cache()
            .current_dir(dir.path())
            .env("INPUT_ROOT", "")
            .env("COURSIER_CACHE_STATE_FILE", "")
            .args(["save", "--host", "file", "--state-file"])
            .arg(dir.path().join("state.json"))
            .arg("--store-dir")
            .arg(dir.path().join("store"))
            .assert()
            .success();
    }

    #[test]
    fn save_with_bad_arguments_still_succeeds() {
        let dir = setup_project();
        coursier_cache()
            .current_dir(dir.path())
            .args(["save", "--host", "nowhere"])
            .assert()
            .success()
            .stderr(predicate::str::contains("nowhere"));
    }

    #[test]
    fn restore_with_empty_inputs_succeeds() {
        let dir = setup_project();
        in_project(dir.path(), "job.json", "restore")
            .env("INPUT_IGNOREJOB", "")
            .env("INPUT_IGNOREMATRIX", "")
            .env("INPUT_EXTRAKEY", "")
            .arg("--job")
            .arg("build")
            .assert()
            .success();
        let state = state_json(dir.path(), "job.json");
        let key = state["state"]["COURSIER_CACHE_KEY"].as_str().unwrap();
        assert!(key.starts_with("coursier-build-"));
    }

    #[test]
    fn restore_with_bad_arguments_fails() {
        coursier_cache()
            .args(["restore", "--host", "nowhere"])
            .assert()
            .failure();
    }

    #[test]
    fn invalid_file_list_fails_restore() {
        let dir = setup_project();
        in_project(dir.path(), "job.json", "restore")
            .arg("--extra-files")
            .arg("[\"deps.txt\"")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid file list"));
    }

    #[test]
    fn invalid_config_fails_restore() {
        let dir = setup_project();
        fs::write(dir.path().join("project/.coursier-cache.toml"), "[key\n").unwrap();
        in_project(dir.path(), "job.json", "restore")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn job_name_is_part_of_key() {
        let dir = setup_project();
        in_project(dir.path(), "job.json", "restore")
            .arg("--job")
            .arg("test")
            .assert()
            .success();
        let state = state_json(dir.path(), "job.json");
        let key = state["state"]["COURSIER_CACHE_KEY"].as_str().unwrap();
        assert!(key.starts_with("coursier-test-"));
        assert_eq!(key.len(), "coursier-test-".len() + 64);
    }
}
