//! Interactive `ponto setup`.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use severino_core::auth::{normalize_company_code, normalize_tax_id};
use severino_core::{Credentials, Portal, PontoError, SessionManager};

pub async fn run<P: Portal>(session: &SessionManager<P>) -> Result<()> {
    let store = session.credentials();

    if let Some(existing) = store.load() {
        println!("Current credentials:");
        println!("  emp: {}", existing.company_code);
        println!("  cpf: {}", existing.tax_id);
        println!("  funcionario: {}", existing.employee_id.as_deref().unwrap_or_default());

        if !confirm("Overwrite the existing credentials?")? {
            println!("No changes made.");
            return Ok(());
        }
    }

    let Some(company_code) = prompt_company_code()? else {
        println!("Setup cancelled.");
        return Ok(());
    };
    let Some(tax_id) = prompt_tax_id()? else {
        println!("Setup cancelled.");
        return Ok(());
    };

    println!("\nAuthenticating...");
    let employee_id = session.fetch_employee_id(&company_code, &tax_id).await?;

    let credentials = Credentials::new(company_code, tax_id, Some(employee_id));
    store.save(&credentials).map_err(PontoError::from)?;

    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

/// Ask until a non-empty company code is given. `None` on end of input.
fn prompt_company_code() -> Result<Option<String>> {
    loop {
        let Some(line) = prompt_line("Company code (emp): ")? else {
            return Ok(None);
        };
        let code = normalize_company_code(&line);
        if !code.is_empty() {
            return Ok(Some(code));
        }
        println!("Enter the company code");
    }
}

/// Ask until the CPF contains at least one digit. Input is hidden.
fn prompt_tax_id() -> Result<Option<String>> {
    loop {
        let raw = match rpassword::prompt_password("CPF: ") {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let tax_id = normalize_tax_id(&raw);
        if !tax_id.is_empty() {
            return Ok(Some(tax_id));
        }
        println!("Enter the CPF");
    }
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?.unwrap_or_default();
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "sim")
}

fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
