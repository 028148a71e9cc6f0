use crate::cmd::open_store;
use crate::output::{print_json, print_table, short_time};
use anyhow::Context;
use clap::{Args, Subcommand};
use quadra_core::decision::{decide_by_id, DecisionOutcome};
use quadra_core::identity::Identity;
use quadra_core::invitation::{issue_invitation, Invitation, NewInvitation};
use quadra_core::store::RosterStore;
use quadra_core::types::Decision;
use quadra_core::watch::watch_pending;
use quadra_core::{paths, RosterError};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum InviteSubcommand {
    /// Issue a pending invitation to join a team
    Create {
        /// Team id
        #[arg(long)]
        team: String,
        /// Team display name shown to the invitee
        #[arg(long)]
        team_name: String,
        /// Invitee email
        #[arg(long)]
        email: String,
        /// Role granted on acceptance (e.g. player, coach)
        #[arg(long)]
        role: String,
        /// uid of the person issuing the invitation
        #[arg(long)]
        by: Option<String>,
        /// Explicit invitation id (default: generated)
        #[arg(long)]
        id: Option<String>,
    },

    /// List pending invitations addressed to an email
    List {
        #[arg(long)]
        email: String,
    },

    /// List every invitation a team has issued
    Team { team_id: String },

    /// Show one invitation
    Show { id: String },

    /// Accept a pending invitation and join the team
    Accept {
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Decline a pending invitation
    Decline {
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Print the pending invitations for an email, then again on every change
    Watch {
        #[arg(long)]
        email: String,
        /// Exit after printing the current set
        #[arg(long)]
        once: bool,
    },
}

/// The identity making a decision.
#[derive(Args)]
pub struct ActorArgs {
    #[arg(long, env = "QUADRA_UID")]
    uid: String,
    #[arg(long = "as", value_name = "EMAIL", env = "QUADRA_EMAIL")]
    email: String,
    #[arg(long, env = "QUADRA_NAME", default_value = "")]
    name: String,
}

impl ActorArgs {
    fn identity(&self) -> Identity {
        Identity::new(&self.uid, &self.email, &self.name)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: InviteSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        InviteSubcommand::Create {
            team,
            team_name,
            email,
            role,
            by,
            id,
        } => {
            let mut params = NewInvitation::new(team, team_name, email, role);
            if let Some(uid) = by {
                params = params.invited_by(uid);
            }
            if let Some(id) = id {
                params = params.with_id(id);
            }
            create(root, params, json)
        }
        InviteSubcommand::List { email } => list(root, &email, json),
        InviteSubcommand::Team { team_id } => team(root, &team_id, json),
        InviteSubcommand::Show { id } => show(root, &id, json),
        InviteSubcommand::Accept { id, actor } => {
            decide(root, &id, Decision::Accept, &actor.identity(), json)
        }
        InviteSubcommand::Decline { id, actor } => {
            decide(root, &id, Decision::Decline, &actor.identity(), json)
        }
        InviteSubcommand::Watch { email, once } => watch(root, &email, once, json),
    }
}

// ---------------------------------------------------------------------------
// create / list / team / show
// ---------------------------------------------------------------------------

fn create(root: &Path, params: NewInvitation, json: bool) -> anyhow::Result<()> {
    let (_, db) = open_store(root)?;
    let team_id = params.team_id.clone();
    let invitation = issue_invitation(&db, params)
        .with_context(|| format!("failed to invite to team '{team_id}'"))?;

    if json {
        print_json(&invitation)?;
    } else {
        println!(
            "Invited {} to {} as {} (id: {})",
            invitation.invited_user_email, invitation.team_name, invitation.role, invitation.id
        );
    }
    Ok(())
}

fn list(root: &Path, email: &str, json: bool) -> anyhow::Result<()> {
    let email = paths::validated_email(email)?;
    let (_, db) = open_store(root)?;
    let pending = db
        .pending_invitations_for(&email)
        .context("failed to list pending invitations")?;

    if json {
        return print_json(&pending);
    }
    print_pending(&email, &pending);
    Ok(())
}

fn print_pending(email: &str, pending: &[Invitation]) {
    let rows = pending
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.team_name.clone(),
                i.role.clone(),
                short_time(&i.created_at),
            ]
        })
        .collect();
    print_table(
        &["ID", "TEAM", "ROLE", "INVITED"],
        rows,
        &format!("No pending invitations for {email}."),
    );
}

fn team(root: &Path, team_id: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_id(team_id)?;
    let (_, db) = open_store(root)?;
    let invitations = db
        .team_invitations(team_id)
        .with_context(|| format!("failed to list invitations for team '{team_id}'"))?;

    if json {
        return print_json(&invitations);
    }

    let rows = invitations
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.invited_user_email.clone(),
                i.role.clone(),
                i.status.to_string(),
                short_time(&i.updated_at),
            ]
        })
        .collect();
    print_table(
        &["ID", "EMAIL", "ROLE", "STATUS", "UPDATED"],
        rows,
        &format!("Team '{team_id}' has issued no invitations."),
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (_, db) = open_store(root)?;
    let invitation = db
        .get_invitation(id)?
        .ok_or_else(|| RosterError::InvitationNotFound(id.to_string()))?;

    if json {
        return print_json(&invitation);
    }

    println!("Invitation: {}", invitation.id);
    println!("Team:       {} ({})", invitation.team_name, invitation.team_id);
    println!("Email:      {}", invitation.invited_user_email);
    println!("Role:       {}", invitation.role);
    println!("Status:     {}", invitation.status);
    if let Some(ref by) = invitation.invited_by {
        println!("Invited by: {by}");
    }
    println!("Created:    {}", short_time(&invitation.created_at));
    println!("Updated:    {}", short_time(&invitation.updated_at));
    Ok(())
}

// ---------------------------------------------------------------------------
// accept / decline
// ---------------------------------------------------------------------------

fn decide(
    root: &Path,
    id: &str,
    decision: Decision,
    actor: &Identity,
    json: bool,
) -> anyhow::Result<()> {
    let (_, db) = open_store(root)?;
    let outcome: DecisionOutcome = decide_by_id(&db, id, decision, actor)
        .with_context(|| format!("failed to {decision} invitation '{id}'"))?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("{}", outcome.summary());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

fn watch(root: &Path, email: &str, once: bool, json: bool) -> anyhow::Result<()> {
    let email = paths::validated_email(email)?;
    let (_, db) = open_store(root)?;
    let store: Arc<dyn RosterStore> = Arc::new(db);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Invitation>>();
        let subscription = watch_pending(store, &email, move |pending| {
            let _ = tx.send(pending);
        })?;

        loop {
            let pending = tokio::select! {
                next = rx.recv() => match next {
                    Some(pending) => pending,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            };

            if json {
                println!("{}", serde_json::to_string(&pending)?);
            } else {
                print_pending(&email, &pending);
                println!();
            }
            if once {
                break;
            }
        }

        subscription.cancel();
        Ok::<(), anyhow::Error>(())
    })
}
