use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub fn read_pin() -> Result<Zeroizing<String>> {
    //  Environment Variable
    //  FIELDSEAL_PIN="123456" fieldseal verify-pin <verifier>
    if let Ok(pin) = std::env::var("FIELDSEAL_PIN") {
        if !pin.is_empty() {
            return Ok(Zeroizing::new(pin));
        }
    }

    //  stdin (Pipeline)
    //  printf "%s" "$PIN" | fieldseal verify-pin <verifier>
    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        let pin = buf.trim_end().to_string();

        if !pin.is_empty() {
            return Ok(Zeroizing::new(pin));
        }
    }

    //  Interactive (TTY)
    if io::stdin().is_terminal() {
        let pin = rpassword::prompt_password("PIN: ")?;
        if !pin.is_empty() {
            return Ok(Zeroizing::new(pin));
        }
    }

    bail!("No PIN provided")
}

pub fn read_new_pin_with_confirmation() -> Result<Zeroizing<String>> {
    if let Ok(pin) = std::env::var("FIELDSEAL_PIN") {
        if !pin.is_empty() {
            return Ok(Zeroizing::new(pin));
        }
    }

    if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        let mut handle = stdin.lock();

        let mut pin1 = Zeroizing::new(String::new());
        let mut pin2 = Zeroizing::new(String::new());

        handle.read_line(&mut pin1)?;
        handle.read_line(&mut pin2)?;

        trim_newline(&mut pin1);
        trim_newline(&mut pin2);

        if pin1.is_empty() {
            bail!("pin cannot be empty");
        }

        if pin1 != pin2 {
            bail!("pins do not match");
        }

        return Ok(pin1);
    }

    let pin1 = rpassword::prompt_password("New PIN: ")?;
    let pin2 = rpassword::prompt_password("Confirm PIN: ")?;

    if pin1.is_empty() {
        bail!("pin cannot be empty");
    }

    if pin1 != pin2 {
        bail!("pins do not match");
    }

    Ok(Zeroizing::new(pin1))
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
