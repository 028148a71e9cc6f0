use crate::cmd::open_store;
use crate::output::{print_json, print_table, short_time};
use anyhow::Context;
use clap::Subcommand;
use quadra_core::paths;
use quadra_core::store::RosterStore;
use std::path::Path;

#[derive(Subcommand)]
pub enum MemberSubcommand {
    /// List a team's members, oldest first
    List { team_id: String },
}

pub fn run(root: &Path, subcmd: MemberSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MemberSubcommand::List { team_id } => list(root, &team_id, json),
    }
}

fn list(root: &Path, team_id: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_id(team_id)?;
    let (_, db) = open_store(root)?;
    let members = db
        .team_members(team_id)
        .with_context(|| format!("failed to list members of team '{team_id}'"))?;

    if json {
        return print_json(&members);
    }

    let rows = members
        .iter()
        .map(|m| {
            vec![
                m.user_id.clone(),
                m.name.clone(),
                m.email.clone(),
                m.role.clone(),
                short_time(&m.joined_at),
            ]
        })
        .collect();
    print_table(
        &["UID", "NAME", "EMAIL", "ROLE", "JOINED"],
        rows,
        &format!("Team '{team_id}' has no members yet."),
    );
    Ok(())
}
