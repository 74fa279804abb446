use crate::support::{run_cli, stderr, stdout, Workspace};

fn issued_bundle(workspace: &Workspace) -> std::path::PathBuf {
    let out = workspace.path("bundle.pem");
    let output = workspace.issue(
        &["pki.ca=corp", "pki.cn=api.internal", "pki.usage=server", "pki.dns_names=api.internal"],
        &["--out", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    out
}

#[test]
fn inspect_prints_every_certificate() {
    let workspace = Workspace::new();
    let bundle = issued_bundle(&workspace);

    let output = run_cli(&["inspect", bundle.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Private key: RSA PRIVATE KEY"));
    assert!(text.contains("Certificate 0\n"));
    assert!(text.contains("Certificate 1 (CA)"));
    assert!(text.contains("Certificate 2 (CA)"));
    assert!(text.contains("DNS names:  api.internal"));
}

#[test]
fn inspect_json_is_machine_readable() {
    let workspace = Workspace::new();
    let bundle = issued_bundle(&workspace);

    let output = run_cli(&["inspect", "--json", bundle.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["key_type"], "RSA PRIVATE KEY");
    let certificates = summary["certificates"].as_array().unwrap();
    assert_eq!(certificates.len(), 3);
    assert_eq!(certificates[0]["is_ca"], false);
    assert_eq!(certificates[0]["dns_names"][0], "api.internal");
}

#[test]
fn inspect_rejects_non_bundle() {
    let workspace = Workspace::new();
    let output = run_cli(&["inspect", workspace.ca_cert.to_str().unwrap()]);
    assert!(!output.status.success());
}
