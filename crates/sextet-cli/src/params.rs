//! Synthesis parameter parsing for `--set key=value`.

use sextet_synth::{
    ChorusMode, DcoRange, HpfMode, PolyMode, PwmMode, SynthParams, VcaMode, VcfPolarity,
};

/// Error type for parameter assignment.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for '{param}': {message}")]
    InvalidValue { param: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Information about a synthesis parameter.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub range: &'static str,
}

const UNIT: &str = "0-1";

/// Every parameter accepted by [`apply`].
pub const PARAMS: &[ParamInfo] = &[
    ParamInfo { name: "dco_range", description: "Oscillator footage", range: "16|8|4" },
    ParamInfo { name: "saw", description: "Sawtooth on", range: "on|off" },
    ParamInfo { name: "pulse", description: "Pulse on", range: "on|off" },
    ParamInfo { name: "pwm", description: "Pulse width amount", range: UNIT },
    ParamInfo { name: "pwm_mode", description: "Pulse width source", range: "lfo|manual" },
    ParamInfo { name: "sub", description: "Sub-octave level", range: UNIT },
    ParamInfo { name: "noise", description: "Noise level", range: UNIT },
    ParamInfo { name: "lfo_to_dco", description: "Vibrato depth", range: UNIT },
    ParamInfo { name: "hpf", description: "High-pass / bass boost", range: "boost|flat|low|high" },
    ParamInfo { name: "cutoff", description: "VCF cutoff", range: UNIT },
    ParamInfo { name: "resonance", description: "VCF resonance", range: UNIT },
    ParamInfo { name: "env", description: "Envelope to VCF", range: UNIT },
    ParamInfo { name: "lfo_to_vcf", description: "LFO to VCF", range: UNIT },
    ParamInfo { name: "key_track", description: "Keyboard tracking", range: UNIT },
    ParamInfo { name: "polarity", description: "Envelope polarity", range: "normal|inverted" },
    ParamInfo { name: "vca_mode", description: "VCA source", range: "env|gate" },
    ParamInfo { name: "vca_level", description: "Gate-mode level", range: UNIT },
    ParamInfo { name: "attack", description: "Attack time", range: UNIT },
    ParamInfo { name: "decay", description: "Decay time", range: UNIT },
    ParamInfo { name: "sustain", description: "Sustain level", range: UNIT },
    ParamInfo { name: "release", description: "Release time", range: UNIT },
    ParamInfo { name: "lfo_rate", description: "LFO rate (0.1-30 Hz)", range: UNIT },
    ParamInfo { name: "lfo_delay", description: "LFO fade-in (0-5 s)", range: UNIT },
    ParamInfo { name: "chorus", description: "Ensemble mode", range: "off|i|ii|both" },
    ParamInfo { name: "poly_mode", description: "Voice assignment", range: "poly1|poly2|unison" },
    ParamInfo { name: "bender", description: "Pitch bend position", range: "-1-1" },
    ParamInfo { name: "bend_dco", description: "Bend to pitch", range: UNIT },
    ParamInfo { name: "bend_vcf", description: "Bend to VCF", range: UNIT },
    ParamInfo { name: "mod_wheel", description: "Mod wheel", range: UNIT },
    ParamInfo { name: "portamento", description: "Glide on (unison)", range: "on|off" },
    ParamInfo { name: "portamento_legato", description: "Glide only when legato", range: "on|off" },
    ParamInfo { name: "portamento_time", description: "Glide time (0-5 s)", range: UNIT },
    ParamInfo { name: "tune", description: "Master tune in cents", range: "-100-100" },
    ParamInfo { name: "drift", description: "Analog pitch drift", range: UNIT },
    ParamInfo { name: "master", description: "Output level", range: UNIT },
];

/// Print the parameter table.
pub fn print_params() {
    println!("Synthesis Parameters (use with --set key=value):\n");
    for info in PARAMS {
        println!("  {:<18} {:<24} [{}]", info.name, info.description, info.range);
    }
}

/// Split `key=value`.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), ParamError> {
    let (key, value) = assignment.split_once('=').ok_or_else(|| {
        ParamError::ParseError(format!(
            "Invalid parameter format: '{}' (expected key=value)",
            assignment
        ))
    })?;
    Ok((key.trim(), value.trim()))
}

/// Apply one `key=value` assignment to `params`.
pub fn apply(params: &mut SynthParams, assignment: &str) -> Result<(), ParamError> {
    let (key, value) = parse_assignment(assignment)?;
    let key_lower = key.to_lowercase();
    match key_lower.as_str() {
        "dco_range" => {
            params.dco_range = match value {
                "16" => DcoRange::Feet16,
                "8" => DcoRange::Feet8,
                "4" => DcoRange::Feet4,
                _ => return Err(invalid(key, value, "16|8|4")),
            }
        }
        "saw" => params.saw_on = parse_switch(key, value)?,
        "pulse" => params.pulse_on = parse_switch(key, value)?,
        "pwm" => params.pwm = parse_unit(key, value)?,
        "pwm_mode" => {
            params.pwm_mode = match value.to_lowercase().as_str() {
                "lfo" => PwmMode::Lfo,
                "manual" => PwmMode::Manual,
                _ => return Err(invalid(key, value, "lfo|manual")),
            }
        }
        "sub" => params.sub_level = parse_unit(key, value)?,
        "noise" => params.noise_level = parse_unit(key, value)?,
        "lfo_to_dco" => params.lfo_to_dco = parse_unit(key, value)?,
        "hpf" => {
            params.hpf_mode = match value.to_lowercase().as_str() {
                "boost" | "0" => HpfMode::BassBoost,
                "flat" | "1" => HpfMode::Flat,
                "low" | "2" => HpfMode::Low,
                "high" | "3" => HpfMode::High,
                _ => return Err(invalid(key, value, "boost|flat|low|high")),
            }
        }
        "cutoff" => params.vcf_cutoff = parse_unit(key, value)?,
        "resonance" => params.resonance = parse_unit(key, value)?,
        "env" => params.env_amount = parse_unit(key, value)?,
        "lfo_to_vcf" => params.lfo_to_vcf = parse_unit(key, value)?,
        "key_track" => params.key_tracking = parse_unit(key, value)?,
        "polarity" => {
            params.vcf_polarity = match value.to_lowercase().as_str() {
                "normal" => VcfPolarity::Normal,
                "inverted" => VcfPolarity::Inverted,
                _ => return Err(invalid(key, value, "normal|inverted")),
            }
        }
        "vca_mode" => {
            params.vca_mode = match value.to_lowercase().as_str() {
                "env" => VcaMode::Envelope,
                "gate" => VcaMode::Gate,
                _ => return Err(invalid(key, value, "env|gate")),
            }
        }
        "vca_level" => params.vca_level = parse_unit(key, value)?,
        "attack" => params.attack = parse_unit(key, value)?,
        "decay" => params.decay = parse_unit(key, value)?,
        "sustain" => params.sustain = parse_unit(key, value)?,
        "release" => params.release = parse_unit(key, value)?,
        "lfo_rate" => params.lfo_rate = parse_unit(key, value)?,
        "lfo_delay" => params.lfo_delay = parse_unit(key, value)?,
        "chorus" => params.chorus = parse_chorus(value).ok_or_else(|| invalid(key, value, "off|i|ii|both"))?,
        "poly_mode" => {
            params.poly_mode =
                parse_poly_mode(value).ok_or_else(|| invalid(key, value, "poly1|poly2|unison"))?
        }
        "bender" => params.bender = parse_ranged(key, value, -1.0, 1.0)?,
        "bend_dco" => params.bender_to_dco = parse_unit(key, value)?,
        "bend_vcf" => params.bender_to_vcf = parse_unit(key, value)?,
        "mod_wheel" => params.mod_wheel = parse_unit(key, value)?,
        "portamento" => params.portamento_on = parse_switch(key, value)?,
        "portamento_legato" => params.portamento_legato = parse_switch(key, value)?,
        "portamento_time" => params.portamento_time = parse_unit(key, value)?,
        "tune" => params.tune = parse_ranged(key, value, -100.0, 100.0)?,
        "drift" => params.drift = parse_unit(key, value)?,
        "master" => params.master_level = parse_unit(key, value)?,
        _ => return Err(ParamError::UnknownParameter(key.to_string())),
    }
    Ok(())
}

/// Chorus mode by name.
pub fn parse_chorus(value: &str) -> Option<ChorusMode> {
    match value.to_lowercase().as_str() {
        "off" => Some(ChorusMode::Off),
        "i" | "1" => Some(ChorusMode::I),
        "ii" | "2" => Some(ChorusMode::II),
        "both" | "i+ii" => Some(ChorusMode::Both),
        _ => None,
    }
}

/// Poly mode by name.
pub fn parse_poly_mode(value: &str) -> Option<PolyMode> {
    match value.to_lowercase().as_str() {
        "poly1" => Some(PolyMode::Poly1),
        "poly2" => Some(PolyMode::Poly2),
        "unison" => Some(PolyMode::Unison),
        _ => None,
    }
}

fn invalid(param: &str, value: &str, expected: &str) -> ParamError {
    ParamError::InvalidValue {
        param: param.to_string(),
        message: format!("'{}' (expected {})", value, expected),
    }
}

fn parse_switch(param: &str, value: &str) -> Result<bool, ParamError> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(invalid(param, value, "on|off")),
    }
}

fn parse_ranged(param: &str, value: &str, min: f32, max: f32) -> Result<f32, ParamError> {
    let parsed: f32 = value.parse().map_err(|_| ParamError::InvalidValue {
        param: param.to_string(),
        message: format!("'{}' is not a number", value),
    })?;
    if !(min..=max).contains(&parsed) {
        return Err(ParamError::InvalidValue {
            param: param.to_string(),
            message: format!("{} is outside {}..={}", parsed, min, max),
        });
    }
    Ok(parsed)
}

fn parse_unit(param: &str, value: &str) -> Result<f32, ParamError> {
    parse_ranged(param, value, 0.0, 1.0)
}
