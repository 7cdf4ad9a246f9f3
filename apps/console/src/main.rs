use std::sync::Arc;

use anyhow::Result;
use attendance_core::{
    AttendanceSession, AuthSession, CaptureDevice, MissingAuthSession, MissingCaptureDevice,
    PhotoUploader, RosterStore, StaticAuthSession, UploadJobKind,
};
use clap::Parser;
use shared::domain::{PermissionStatus, Person, StudentId};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    bearer_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = attendance_core::load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(token) = args.bearer_token {
        settings.bearer_token = Some(token);
    }

    let auth: Arc<dyn AuthSession> = match settings.bearer_token.clone() {
        Some(token) => Arc::new(StaticAuthSession::new(token)),
        None => Arc::new(MissingAuthSession),
    };
    let uploader = PhotoUploader::new(settings.server_url.clone(), settings.upload_timeout(), auth)?;

    let device = Arc::new(MissingCaptureDevice);
    if device.request_permission().await? == PermissionStatus::Denied {
        println!("Camera permission denied; smart capture is disabled on this host.");
    }
    let session = AttendanceSession::new(demo_roster(), device, uploader);
    tracing::info!(server_url = %settings.server_url, "attendance session ready");

    session.begin_attendance_round().await;
    session.toggle_manual(&StudentId::new("S001")).await?;
    session.toggle_manual(&StudentId::new("S003")).await?;

    let summary = session.submit_attendance_round().await?;
    println!("Present: {}", summary.present.join(", "));
    println!("Absent: {}", summary.absent.join(", "));

    match session.start_smart_capture(UploadJobKind::Attendance).await {
        Ok(()) => println!("Camera armed; ready to capture."),
        Err(err) => println!("Smart capture unavailable on this host: {err}"),
    }

    Ok(())
}

fn demo_roster() -> RosterStore {
    RosterStore::new(vec![
        Person::new(StudentId::new("S001"), "John Doe").with_registration(true),
        Person::new(StudentId::new("S002"), "Jane Smith"),
        Person::new(StudentId::new("S003"), "Alice Johnson").with_registration(true),
        Person::new(StudentId::new("S004"), "Bob Williams"),
    ])
}
