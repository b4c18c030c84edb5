//! Command implementations

use anyhow::{bail, Context, Result};
use maquette_client::ApiClient;
use maquette_core::{ModelFormat, ModelId};
use maquette_viewer::{FrameLoop, SessionState, ViewerSession};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn register(
    client: &Arc<ApiClient>,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let creds = client
        .register(username, email, password)
        .await
        .context("Registration failed")?;
    println!("Registered and signed in as {} <{}>", creds.username, creds.email);
    Ok(())
}

pub async fn login(client: &Arc<ApiClient>, email: &str, password: &str) -> Result<()> {
    let creds = client
        .login(email, password)
        .await
        .context("Login failed")?;
    println!("Signed in as {} <{}>", creds.username, creds.email);
    Ok(())
}

pub fn logout(client: &Arc<ApiClient>) -> Result<()> {
    client.logout();
    println!("Signed out");
    Ok(())
}

pub fn whoami(client: &Arc<ApiClient>) -> Result<()> {
    match client.session().current() {
        Some(creds) => println!("{} <{}>", creds.username, creds.email),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn list(client: &Arc<ApiClient>) -> Result<()> {
    let models = client.list_models().await.context("Failed to fetch models")?;
    if models.is_empty() {
        println!("No models uploaded yet.");
        return Ok(());
    }

    println!("{} model(s):", models.len());
    for model in &models {
        println!(
            "  {}  {} ({})",
            model.id, model.original_name, model.file_extension
        );
    }
    Ok(())
}

pub async fn upload(client: &Arc<ApiClient>, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("invalid file name")?;
    if ModelFormat::from_name(name).is_none() {
        bail!("unsupported file format (expected .glb, .gltf, or .obj)");
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let model = client
        .upload_model(name, bytes)
        .await
        .context("Upload failed")?;
    println!("Uploaded {} as {}", model.original_name, model.id);
    Ok(())
}

pub async fn delete(client: &Arc<ApiClient>, id: &str, yes: bool) -> Result<()> {
    if !yes {
        print!("Delete model {id}? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    client
        .delete_model(&ModelId::from(id))
        .await
        .context("Delete failed")?;
    println!("Deleted {id}");
    Ok(())
}

pub async fn view(
    client: &Arc<ApiClient>,
    id: &str,
    save_view: Option<String>,
    apply_view: Option<String>,
    frames: u64,
) -> Result<()> {
    let session = ViewerSession::new(client.clone());

    if let Err(err) = session.open(&ModelId::from(id)).await {
        bail!("{}: {}", err.user_message(), err.detail());
    }

    // Wait for the geometry decode to settle; the frame loop is already
    // running over the empty scene in the meantime.
    let decode_deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while !session.decode_settled() {
        if tokio::time::Instant::now() > decode_deadline {
            session.close();
            bail!("timed out waiting for geometry decode");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    if let SessionState::Error {
        message, detail, ..
    } = session.state()
    {
        session.close();
        bail!("{message}: {detail}");
    }

    if let Some(model) = session.model() {
        println!("Viewing {} ({} meshes)", model.original_name, session.mesh_count());
    }

    let views = session.viewpoints();
    if views.is_empty() {
        println!("No saved views yet");
    } else {
        println!("{} saved view(s):", views.len());
        for view in &views {
            println!(
                "  {}  {} ({})",
                view.id,
                view.name,
                view.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    if let Some(viewpoint_id) = apply_view {
        session
            .apply_viewpoint(&viewpoint_id)
            .with_context(|| format!("failed to apply view {viewpoint_id}"))?;
        println!("Applied view {viewpoint_id}");
    }

    if let Some(name) = save_view {
        match session.capture_viewpoint(&name).await {
            Ok(saved) => println!("Saved view \"{}\" as {}", saved.name, saved.id),
            Err(err) => {
                session.close();
                bail!("Failed to save view: {}", err.detail());
            }
        }
    }

    // Let the frame loop run for the requested stretch, then report
    tokio::time::sleep(FrameLoop::FRAME_INTERVAL * frames as u32).await;
    println!("Rendered {} frames", session.frames_rendered());

    session.close();
    Ok(())
}
