//! Subcommand handlers. Each one talks to the API only through the
//! `AuthClient` and reads the session only through its store.

use std::future::Future;
use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use tracing::{error, warn};

use rehber_core::api::{ApiClient, ApiError, ApiResult};
use rehber_core::config::DynSession;
use rehber_core::models::{
    ActivityFilter, ActivityInput, MeetingFilter, MeetingInput, StudentInput,
};
use rehber_core::{AuthClient, AuthState, Config, SessionStore};

use crate::format;

type Auth = AuthClient<DynSession>;

/// Environment variable supplying the login email
const EMAIL_ENV: &str = "REHBER_EMAIL";

/// Environment variable supplying the login password
const PASSWORD_ENV: &str = "REHBER_PASSWORD";

/// Run an authenticated request. A 401 clears the stored session, since
/// the server no longer accepts its token.
async fn fetch<T, F, Fut>(auth: &Auth, request: F) -> Result<T>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    auth.authorized(request).await.map_err(|e| {
        match e {
            ApiError::Unauthorized | ApiError::NotAuthenticated => warn!(error = %e, "Not signed in"),
            _ => error!(error = %e, "Request failed"),
        }
        anyhow!(e.user_message())
    })
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), default) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

pub async fn login(auth: &Auth, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| std::env::var(EMAIL_ENV).ok()) {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let envelope = auth.login(&email, &password).await;
    if !envelope.success {
        bail!("Login failed: {}", envelope.error_message());
    }

    config.last_email = Some(email.trim().to_string());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    match envelope.data {
        Some(data) => println!("Logged in as {} <{}>", data.user.full_name, data.user.email),
        None => println!("Logged in"),
    }
    Ok(())
}

pub async fn logout(auth: &Auth) -> Result<()> {
    auth.logout().await;
    println!("Logged out");
    Ok(())
}

pub fn status(auth: &Auth) -> Result<()> {
    match auth.state() {
        AuthState::Authenticated(user) => {
            println!("Logged in as {} <{}> (id {})", user.full_name, user.email, user.id)
        }
        AuthState::Anonymous => println!("Not logged in"),
    }
    Ok(())
}

pub async fn whoami(auth: &Auth) -> Result<()> {
    let envelope = auth.refresh_user().await;
    if !envelope.success {
        bail!(envelope.error_message().to_string());
    }
    // Print what the store now holds, which is what later commands will see
    let user = auth
        .store()
        .current_user()
        .or(envelope.data)
        .ok_or_else(|| anyhow!("No user returned"))?;
    println!("{} <{}> (id {})", user.full_name, user.email, user.id);
    Ok(())
}

pub async fn stats(auth: &Auth) -> Result<()> {
    let stats = fetch(auth, |api| async move { api.dashboard_stats().await }).await?;
    if let Some(user) = auth.current_user() {
        println!("Welcome, {}\n", user.full_name);
    }
    print!("{}", format::stats(&stats));
    Ok(())
}

pub async fn recent(auth: &Auth) -> Result<()> {
    let students = fetch(auth, |api| async move { api.recent_students().await }).await?;
    print!("{}", format::students(&students));
    Ok(())
}

pub async fn students(auth: &Auth, class_name: Option<&str>) -> Result<()> {
    let class_name = class_name.map(str::to_string);
    let students = fetch(auth, |api| async move {
        api.students(class_name.as_deref()).await
    })
    .await?;
    print!("{}", format::students(&students));
    Ok(())
}

pub async fn student(auth: &Auth, id: i64) -> Result<()> {
    let student = fetch(auth, |api| async move { api.student(id).await }).await?;
    print!("{}", format::student_detail(&student));
    Ok(())
}

pub async fn meetings(
    auth: &Auth,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    student_id: Option<i64>,
) -> Result<()> {
    let filter = MeetingFilter {
        from,
        to,
        student_id,
    };
    let meetings = fetch(auth, |api| async move { api.meetings(&filter).await }).await?;
    print!("{}", format::meetings(&meetings));
    Ok(())
}

pub async fn activities(auth: &Auth, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let filter = ActivityFilter { from, to };
    let activities = fetch(auth, |api| async move { api.activities(&filter).await }).await?;
    print!("{}", format::activities(&activities));
    Ok(())
}

pub async fn add_student(auth: &Auth, input: StudentInput) -> Result<()> {
    let id = fetch(auth, |api| async move { api.create_student(&input).await }).await?;
    println!("Added student {}", id);
    Ok(())
}

pub async fn add_meeting(auth: &Auth, input: MeetingInput) -> Result<()> {
    let id = fetch(auth, |api| async move { api.create_meeting(&input).await }).await?;
    println!("Added meeting {}", id);
    Ok(())
}

pub async fn add_activity(auth: &Auth, input: ActivityInput) -> Result<()> {
    let id = fetch(auth, |api| async move { api.create_activity(&input).await }).await?;
    println!("Added activity {}", id);
    Ok(())
}

fn print_done(message: Option<String>, fallback: &str) {
    println!("{}", message.as_deref().unwrap_or(fallback));
}

pub async fn delete_student(auth: &Auth, id: i64) -> Result<()> {
    let message = fetch(auth, |api| async move { api.delete_student(id).await }).await?;
    print_done(message, "Student deleted");
    Ok(())
}

pub async fn delete_meeting(auth: &Auth, id: i64) -> Result<()> {
    let message = fetch(auth, |api| async move { api.delete_meeting(id).await }).await?;
    print_done(message, "Meeting deleted");
    Ok(())
}

pub async fn delete_activity(auth: &Auth, id: i64) -> Result<()> {
    let message = fetch(auth, |api| async move { api.delete_activity(id).await }).await?;
    print_done(message, "Activity deleted");
    Ok(())
}
