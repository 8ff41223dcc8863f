use assert_cmd::Command;
use predicates::str::contains;
use std::{fs, path::Path};
use tempfile::tempdir;

fn crm(dir: &Path) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    cmd.current_dir(dir)
        .env("STORAGE_CHOICE", "local")
        .env("ORGANIZATIONS_PATH", dir.join("organizations.json"))
        .env("CONTACTS_PATH", dir.join("contacts.json"))
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn id_from(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|line| line.strip_prefix("id: ").map(str::to_string))
        .unwrap_or_default()
}

fn seed(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let output = crm(dir)?
        .args(["add", "--name", "Acme", "--country", "Germany"])
        .output()?;
    let id = id_from(&output.stdout);

    for (name, email, language) in [
        ("Ann", "ann@acme.test", "DE"),
        ("Bob", "bob@acme.test", "fr"),
    ] {
        crm(dir)?
            .args([
                "add-contact",
                "--org",
                &id,
                "--name",
                name,
                "--email",
                email,
                "--language",
                language,
            ])
            .assert()
            .success();
    }
    Ok(id)
}

#[test]
fn export_delete_import() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let id = seed(dir.path())?;

    // Export into a directory uses the dated file name
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir)?;
    crm(dir.path())?
        .args(["export", "--des", &out_dir.to_string_lossy()])
        .assert()
        .success()
        .stdout(contains("Exported 1 organizations"))
        .stdout(contains("crm-export-"));

    let exported = fs::read_dir(&out_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "xlsx"))
        .ok_or("no export file written")?;

    crm(dir.path())?
        .args(["delete", "--id", &id])
        .assert()
        .success();

    crm(dir.path())?
        .args([
            "import",
            "--src",
            &exported.to_string_lossy(),
            "--delimiter",
            "semicolon",
        ])
        .assert()
        .success()
        .stdout(contains("Imported 1 organizations and 2 contacts"))
        .stdout(contains("ann@acme.test; bob@acme.test"));

    crm(dir.path())?
        .args(["contacts", "--org", &id])
        .assert()
        .success()
        .stdout(contains("Ann"))
        .stdout(contains(" FR"));
    Ok(())
}

#[test]
fn json_workbook_export_and_import() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path())?;
    let out = dir.path().join("book.json");

    crm(dir.path())?
        .args(["export", "--format", "json", "--des", &out.to_string_lossy()])
        .assert()
        .success();

    let text = fs::read_to_string(&out)?;
    assert!(text.contains("\"Organizations\""));
    assert!(text.contains("\"Country/Region\": \"Germany\""));

    crm(dir.path())?
        .args(["import", "--src", &out.to_string_lossy()])
        .assert()
        .success()
        .stdout(contains("ann@acme.test, bob@acme.test"));
    Ok(())
}

#[test]
fn rejected_import_keeps_existing_data() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path())?;

    let only_orgs = dir.path().join("only-orgs.json");
    fs::write(
        &only_orgs,
        r#"{"sheets":[{"name":"Organizations","columns":["Name"],"rows":[{"Name":"Intruder"}]}]}"#,
    )?;

    crm(dir.path())?
        .args(["import", "--src", &only_orgs.to_string_lossy()])
        .assert()
        .failure()
        .stderr(contains("Error importing file. Please check the format"));

    let garbage = dir.path().join("garbage.zip");
    fs::write(&garbage, "not a zip archive")?;
    crm(dir.path())?
        .args(["import", "--src", &garbage.to_string_lossy()])
        .assert()
        .failure()
        .stderr(contains("Error importing file"));

    let not_excel = dir.path().join("broken.xlsx");
    fs::write(&not_excel, "plain text")?;
    crm(dir.path())?
        .args(["import", "--src", &not_excel.to_string_lossy()])
        .assert()
        .failure()
        .stderr(contains("Error importing file"));

    crm(dir.path())?
        .args(["import", "--src", "nowhere.zip"])
        .assert()
        .failure()
        .stderr(contains("Import file Not found"));

    crm(dir.path())?
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Acme"));
    Ok(())
}

#[test]
fn export_rejects_wrong_extension() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path())?;

    crm(dir.path())?
        .args(["export", "--des", "exported.csv"])
        .assert()
        .failure()
        .stderr(contains("Export file must be a .xlsx file"));
    Ok(())
}

#[test]
fn csv_bundle_export_and_import() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path())?;
    let out = dir.path().join("bundle.zip");

    crm(dir.path())?
        .args(["export", "--format", "zip", "--des", &out.to_string_lossy()])
        .assert()
        .success();

    crm(dir.path())?
        .args(["import", "--src", &out.to_string_lossy(), "--delimiter", "newline"])
        .assert()
        .success()
        .stdout(contains("ann@acme.test\nbob@acme.test"));
    Ok(())
}
