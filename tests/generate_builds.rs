//! End-to-end generation from layered template documents.

mod fixtures;

use fixtures::{catalog, date, FakeResolver, MemLines, BUILDS, DEFAULTS, LISTS, SUPPORTED};
use packstead::template::TemplateError;
use packstead::{Catalog, Collaborators, GenerateError, Generator, Selection};
use serde_json::json;

fn lines() -> MemLines {
    let mut lines = MemLines::standard("ubuntu");
    lines.0.extend(MemLines::standard("centos").0);
    lines
}

// =============================================================================
// Distro builds
// =============================================================================

#[test]
fn ubuntu_default_build_end_to_end() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let built = generator.distro("ubuntu", &Selection::default()).unwrap();

    assert_eq!(built.build, "ubuntu-16.04-amd64-server");
    assert_eq!(built.name, "ubuntu-16.04-amd64-server");
    assert_eq!(built.dirs.out_dir, "out/ubuntu/ubuntu-16.04-amd64-server");
    assert_eq!(built.dirs.commands_src_dir, "src/ubuntu/commands");
    assert_eq!(built.dirs.http_src_dir, "src/ubuntu/http");
    for value in [
        &built.dirs.src_dir,
        &built.dirs.out_dir,
        &built.dirs.commands_src_dir,
        &built.dirs.http_dir,
        &built.dirs.http_src_dir,
        &built.dirs.scripts_dir,
        &built.dirs.scripts_src_dir,
    ] {
        assert!(!value.contains(':'), "residual placeholder in {value}");
    }

    let template = &built.template;
    assert_eq!(template.description, "packstead test template");
    assert_eq!(template.min_packer_version.as_deref(), Some("0.8.6"));
    assert_eq!(template.builder_types(), vec!["virtualbox-iso", "vmware-iso"]);
    assert_eq!(template.post_processors.len(), 2);
    assert_eq!(template.provisioners.len(), 2);

    let vbox = &template.builders[0];
    assert_eq!(
        vbox["boot_command"],
        json!(["<esc><wait>", "<enter><wait>", "/install/vmlinuz noapic<enter>"])
    );
    assert_eq!(vbox["shutdown_command"], "echo 'vagrant' | sudo -S shutdown -P now");
    assert_eq!(vbox["boot_wait"], "10s");
    assert_eq!(vbox["memory"], 1024);
    assert_eq!(vbox["disk_size"], 20000);
    assert_eq!(vbox["ssh_username"], "vagrant");
    assert_eq!(
        vbox["vboxmanage"],
        json!([
            ["modifyvm", "{{.Name}}", "--memory", "1024"],
            ["modifyvm", "{{.Name}}", "--cpus", "1"]
        ])
    );
    assert_eq!(
        vbox["iso_url"],
        "http://releases.ubuntu.com/16.04/ubuntu-16.04-server-amd64.iso"
    );
    assert_eq!(vbox["iso_checksum_type"], "sha256");
    assert_eq!(vbox["guest_os_type"], "Ubuntu_64");
    assert_eq!(vbox["http_directory"], "http");

    let vmware = &template.builders[1];
    assert_eq!(
        vmware["vmx_data"],
        json!({"cpuid.coresPerSocket": "1", "memsize": "1024"})
    );
    assert_eq!(vmware["guest_os_type"], "ubuntu-64");
    assert_eq!(vmware["iso_url"], vbox["iso_url"]);

    // Both ISO builders share one lookup.
    assert_eq!(*resolver.queries.borrow(), vec!["ubuntu-16.04-amd64-server"]);

    assert_eq!(
        template.post_processors[0]["output"],
        "out/ubuntu/ubuntu-16.04-amd64-server/ubuntu-16.04-amd64-server-{{.Provider}}.box"
    );
    assert_eq!(template.post_processors[0]["keep_input_artifact"], false);
    assert_eq!(template.post_processors[1]["type"], "compress");

    let shell = &template.provisioners[0];
    assert_eq!(
        shell["execute_command"],
        "echo 'vagrant' | {{.Vars}} sudo -E -S sh '{{.Path}}'"
    );
    assert_eq!(
        shell["scripts"],
        json!(["scripts/setup.sh", "scripts/vagrant.sh", "scripts/cleanup.sh"])
    );
    assert_eq!(template.provisioners[1]["source"], "src/ubuntu/files/motd");
    assert_eq!(built.scripts, vec!["setup.sh", "vagrant.sh", "cleanup.sh"]);

    let json = template.to_json().unwrap();
    for placeholder in [":name", ":out_dir", ":src_dir", ":build_name", ":type"] {
        assert!(!json.contains(placeholder), "{placeholder} left in template");
    }
}

#[test]
fn distro_selection_changes_identity_and_lookup() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let selection = Selection {
        arch: Some("i386".to_string()),
        image: Some("desktop".to_string()),
        release: Some("14.04".to_string()),
    };
    let built = generator.distro("ubuntu", &selection).unwrap();
    assert_eq!(built.build, "ubuntu-14.04-i386-desktop");
    assert_eq!(built.template.builders[0]["guest_os_type"], "Ubuntu_32");
    assert_eq!(built.template.builders[1]["guest_os_type"], "ubuntu-32");
    assert_eq!(*resolver.queries.borrow(), vec!["ubuntu-14.04-i386-desktop"]);
}

#[test]
fn centos_default_build_uses_distro_type_lists() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let built = generator.distro("centos", &Selection::default()).unwrap();

    assert_eq!(built.build, "centos-7-x86_64-minimal");
    assert_eq!(built.template.builders[0]["guest_os_type"], "RedHat_64");
    assert_eq!(built.template.builders[1]["guest_os_type"], "centos-64");
    assert_eq!(
        built.template.builders[0]["iso_url"],
        "http://mirror.example.org/centos/7/centos-7-minimal-x86_64.iso"
    );
    assert_eq!(built.template.post_processors.len(), 1);
    assert_eq!(built.template.provisioners.len(), 1);
    assert_eq!(built.template.builders[0]["boot_wait"], "5s");
}

#[test]
fn custom_delimiter() {
    let defaults = DEFAULTS.replace(':', "%");
    let catalog = Catalog::from_toml(&defaults, SUPPORTED, Some(BUILDS), Some(LISTS)).unwrap();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), '%');
    let built = generator.distro("ubuntu", &Selection::default()).unwrap();
    assert_eq!(built.dirs.out_dir, "out/ubuntu/ubuntu-16.04-amd64-server");
    assert_eq!(built.dirs.commands_src_dir, "src/ubuntu/commands");
}

// =============================================================================
// Named builds
// =============================================================================

#[test]
fn named_build_overrides_distro_defaults() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let built = generator.named("web").unwrap();

    assert_eq!(built.build, "web");
    assert_eq!(built.dirs.out_dir, "out/ubuntu/web");
    assert_eq!(built.template.builder_types(), vec!["virtualbox-iso"]);

    let vbox = &built.template.builders[0];
    assert_eq!(vbox["memory"], 4096);
    assert!(vbox.get("cpus").is_none(), "empty value deletes the setting");
    assert_eq!(*resolver.queries.borrow(), vec!["ubuntu-14.04-amd64-server"]);

    assert_eq!(
        built.template.provisioners[0]["scripts"],
        json!(["scripts/setup.sh", "scripts/nginx.sh"])
    );
    assert_eq!(built.scripts, vec!["setup.sh", "nginx.sh"]);
}

#[test]
fn named_build_does_not_leak_into_later_builds() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    generator.named("web").unwrap();
    let built = generator.distro("ubuntu", &Selection::default()).unwrap();
    assert_eq!(built.template.builders.len(), 2);
    assert_eq!(built.template.builders[0]["memory"], 1024);
    assert_eq!(built.template.builders[0]["cpus"], 1);
}

#[test]
fn cloud_build_skips_release_lookup() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let built = generator.named("cloud").unwrap();

    let ebs = &built.template.builders[0];
    assert_eq!(ebs["type"], "amazon-ebs");
    assert_eq!(ebs["ami_name"], "cloud-2016-04-01");
    assert_eq!(ebs["tags"], json!({"Name": "cloud", "Release": "16.04"}));
    assert!(resolver.queries.borrow().is_empty());
    // Common VM settings mean nothing to amazon-ebs; they are reported.
    assert!(built.diagnostics.mentions("amazon-ebs", "boot_command"));
}

#[test]
fn explicit_iso_media_is_kept() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let built = generator.named("pinned").unwrap();
    for builder in &built.template.builders {
        assert_eq!(builder["iso_url"], "http://mirror.example.org/ubuntu.iso");
        assert_eq!(builder["iso_checksum"], "abc123");
        assert_eq!(builder["iso_checksum_type"], "md5");
    }
    assert!(resolver.queries.borrow().is_empty());
}

#[test]
fn missing_command_file_fails_the_build() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = MemLines::default();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let err = generator.named("web").unwrap_err();
    assert_eq!(
        err.to_string(),
        "web: virtualbox-iso: boot_command: src/ubuntu/commands/boot.command: no such command file"
    );
}

#[test]
fn unresolvable_directories_fail_the_build() {
    let builds = format!(
        "{BUILDS}\n[loop]\ntype = \"ubuntu\"\nsrc_dir = \":out_dir/src\"\nout_dir = \":src_dir/out\"\n"
    );
    let catalog = Catalog::from_toml(DEFAULTS, SUPPORTED, Some(&builds), None).unwrap();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let err = generator.named("loop").unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Template {
            source: TemplateError::Unresolved(_),
            ..
        }
    ));
    assert!(err.to_string().contains("unresolved placeholder"));
}

// =============================================================================
// Build lists
// =============================================================================

#[test]
fn build_list_generates_in_order() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let results = generator.list("ubuntu-all").unwrap();
    let names: Vec<&str> = results.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["web", "cloud", "pinned"]);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
}

#[test]
fn build_list_isolates_failures() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let results = generator.list("mixed").unwrap();
    assert_eq!(results.len(), 4);

    assert!(results[0].1.is_ok());
    let badcomm = results[1].1.as_ref().unwrap_err();
    assert_eq!(
        badcomm.to_string(),
        "badcomm: virtualbox-iso: telnet: invalid communicator"
    );
    let nosuch = results[2].1.as_ref().unwrap_err();
    assert_eq!(nosuch.build(), "nosuch");
    assert!(matches!(nosuch, GenerateError::Config { .. }));
    let centos = results[3].1.as_ref().unwrap();
    assert_eq!(centos.build, "centos-min");
    assert_eq!(centos.template.builders[0]["guest_os_type"], "RedHat_64");
}

#[test]
fn unknown_build_list() {
    let catalog = catalog();
    let resolver = FakeResolver::default();
    let lines = lines();
    let collab = Collaborators {
        release: &resolver,
        lines: &lines,
    };
    let mut generator = Generator::new(&catalog, collab, date(), ':');
    let err = generator.list("weekly").unwrap_err();
    assert_eq!(err.to_string(), "weekly: build list not found");
}
