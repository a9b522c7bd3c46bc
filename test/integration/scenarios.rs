// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{list, EnvFixture};

use pathsync::{
    config::Config,
    env::{Scope, PATH_SEPARATOR},
    synchronize, Environment, PathSynchronizer,
};

use anyhow::Result;
use pretty_assertions::assert_eq;

#[test]
fn empty_entries_are_discarded() {
    let result = synchronize(&list(&["", r"C:\A", ""]), &list(&[r"C:\B", ""]));
    assert_eq!(result, list(&[r"C:\A", r"C:\B"]));
}

#[test]
fn duplicates_keep_first_seen_casing() {
    let result = synchronize(&list(&[r"C:\Tools"]), &list(&[r"c:\tools"]));
    assert_eq!(result, list(&[r"C:\Tools"]));
}

#[test]
fn shared_entry_keeps_primary_position() {
    let result = synchronize(
        &list(&[r"C:\User\bin", r"C:\Shared"]),
        &list(&[r"C:\Shared", r"C:\System32"]),
    );
    assert_eq!(result, list(&[r"C:\User\bin", r"C:\Shared", r"C:\System32"]));
}

#[test]
fn configured_selection_drives_synchronizer() -> Result<()> {
    let config: Config = r#"
        [sync]
        mode = "user+process"
        reverse = true
    "#
    .parse()?;
    let env = EnvFixture::new()
        .scope(Scope::User, &["/home/blah/bin", "/usr/local/bin"])
        .scope(Scope::Process, &["/usr/bin", "/USR/LOCAL/BIN/", "/bin"])
        .build();
    let mut sync = PathSynchronizer::new(env);

    let result = sync.apply(&config.sync.selection())?;
    let expect = list(&["/usr/bin", "/USR/LOCAL/BIN/", "/bin", "/home/blah/bin"]);
    assert_eq!(result, expect);

    let env = sync.into_env();
    assert_eq!(env.written(), Some(expect.join(PATH_SEPARATOR).as_str()));
    assert_eq!(env.read(Scope::Process)?, expect);

    Ok(())
}

#[test]
fn repeated_apply_is_stable() -> Result<()> {
    let env = EnvFixture::new()
        .scope(Scope::User, &["/a", "/b", "/A/"])
        .scope(Scope::Machine, &["/c", "/b"])
        .build();
    let selection = Config::default().sync.selection();
    let mut sync = PathSynchronizer::new(env);

    let first = sync.apply(&selection)?;
    let second = sync.apply(&selection)?;
    assert_eq!(first, list(&["/a", "/b", "/c"]));
    assert_eq!(first, second);

    Ok(())
}
