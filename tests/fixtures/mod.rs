//! Shared fixtures for the integration tests: template documents and
//! in-memory stand-ins for release lookups and command files.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use packstead::commands::LineSource;
use packstead::release::{os_type_label, ReleaseError, ReleaseInfo, ReleaseQuery, ReleaseResolver};
use packstead::Catalog;

pub const DEFAULTS: &str = r#"
description = "packstead test template"
min_packer_version = "0.8.6"
name = ":build_name"
src_dir = "src/:distro"
out_dir = ":out/:type/:build_name"
commands_src_dir = ":src_dir/commands"

[build]
builder_types = ["virtualbox-iso", "vmware-iso"]
post_processor_types = ["vagrant", "compress"]
provisioner_types = ["shell", "file"]

[build.builders.common]
settings = [
    "boot_command=boot.command",
    "boot_wait=5s",
    "disk_size=20000",
    "shutdown_command=shutdown.command",
    "ssh_password=vagrant",
    "ssh_username=vagrant",
    "ssh_wait_timeout=30m",
]

[build.builders.virtualbox-iso]
settings = ["memory=1024", "cpus=1"]

[build.builders.virtualbox-iso.arrays]
vboxmanage = ["memory=1024", "cpus=1"]

[build.builders.vmware-iso]
settings = ["memsize=1024"]

[build.builders.vmware-iso.arrays]
vmx_data = ["cpuid.coresPerSocket=1", "memsize=1024"]

[build.post_processors.vagrant]
settings = ["output=:out_dir/:name-{{.Provider}}.box", "keep_input_artifact=false"]

[build.post_processors.compress]
settings = ["output=:out_dir/:name.tar.gz"]

[build.provisioners.shell]
settings = ["execute_command=execute.command"]

[build.provisioners.shell.arrays]
scripts = ["setup.sh", "vagrant.sh", "cleanup.sh"]

[build.provisioners.file]
settings = ["source=:src_dir/files/motd", "destination=/etc/motd"]
"#;

pub const SUPPORTED: &str = r#"
[ubuntu]
arch = ["amd64", "i386"]
image = ["server", "desktop"]
release = ["14.04", "16.04"]
default_image = ["arch=amd64", "image=server", "release=16.04"]
base_url = "http://releases.ubuntu.com/"

[ubuntu.build.builders.common]
settings = ["boot_wait=10s"]

[centos]
arch = ["x86_64"]
image = ["minimal", "DVD"]
release = ["7"]
default_image = ["arch=x86_64", "image=minimal", "release=7"]
base_url = "http://mirror.example.org/centos/"

[centos.build]
post_processor_types = ["vagrant"]
provisioner_types = ["shell"]
"#;

pub const BUILDS: &str = r#"
[web]
type = "ubuntu"
release = "14.04"

[web.build]
builder_types = ["virtualbox-iso"]

[web.build.builders.virtualbox-iso]
settings = ["memory=4096", "cpus="]

[web.build.provisioners.shell.arrays]
scripts = ["setup.sh", "nginx.sh"]

[cloud]
type = "ubuntu"

[cloud.build]
builder_types = ["amazon-ebs"]
provisioner_types = ["shell"]

[cloud.build.builders.amazon-ebs]
settings = [
    "access_key=AKIAEXAMPLE",
    "ami_name=:name-:date",
    "instance_type=t2.micro",
    "region=us-east-1",
    "secret_key=not-a-secret",
    "source_ami=ami-12345",
    "ssh_username=ubuntu",
]

[cloud.build.builders.amazon-ebs.arrays]
tags = ["Name=:name", "Release=:release"]

[pinned]
type = "ubuntu"

[pinned.build.builders.common]
settings = [
    "iso_url=http://mirror.example.org/ubuntu.iso",
    "iso_checksum=abc123",
    "iso_checksum_type=md5",
    "guest_os_type=Ubuntu_64",
]

[badcomm]
type = "ubuntu"

[badcomm.build.builders.common]
settings = ["communicator=telnet"]

[centos-min]
type = "centos"
"#;

pub const LISTS: &str = r#"
[ubuntu-all]
builds = ["web", "cloud", "pinned"]

[mixed]
builds = ["web", "badcomm", "nosuch", "centos-min"]
"#;

pub fn catalog() -> Catalog {
    Catalog::from_toml(DEFAULTS, SUPPORTED, Some(BUILDS), Some(LISTS))
        .expect("fixture documents should decode")
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 4, 1).expect("valid date")
}

/// Answers every lookup from the query alone and records each one.
#[derive(Default)]
pub struct FakeResolver {
    pub queries: RefCell<Vec<String>>,
}

impl ReleaseResolver for FakeResolver {
    fn resolve(&self, query: &ReleaseQuery<'_>) -> Result<ReleaseInfo, ReleaseError> {
        self.queries.borrow_mut().push(format!(
            "{}-{}-{}-{}",
            query.distro, query.release, query.arch, query.image
        ));
        Ok(ReleaseInfo {
            iso_url: format!(
                "{}{}/{}-{}-{}-{}.iso",
                query.base_url, query.release, query.distro, query.release, query.image, query.arch
            ),
            checksum: "0123456789abcdef".to_string(),
            checksum_type: query.checksum_type.to_string(),
            os_type: os_type_label(query.distro, query.arch),
        })
    }
}

/// Command files held in memory, keyed by path.
#[derive(Default)]
pub struct MemLines(pub BTreeMap<PathBuf, Vec<String>>);

impl MemLines {
    pub fn with(mut self, path: &str, lines: &[&str]) -> Self {
        self.0.insert(
            PathBuf::from(path),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// The command files the default documents refer to, for `distro`.
    pub fn standard(distro: &str) -> Self {
        let dir = format!("src/{distro}/commands");
        MemLines::default()
            .with(
                &format!("{dir}/boot.command"),
                &["<esc><wait>", "<enter><wait>", "/install/vmlinuz noapic<enter>"],
            )
            .with(
                &format!("{dir}/shutdown.command"),
                &["echo 'vagrant' | sudo -S shutdown -P now"],
            )
            .with(
                &format!("{dir}/execute.command"),
                &["echo 'vagrant' | {{.Vars}} sudo -E -S sh '{{.Path}}'"],
            )
    }
}

impl LineSource for MemLines {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such command file"))
    }
}
