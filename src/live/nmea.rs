use tracing::warn;

// ---------------------------------------------------------------------------
// NMEA-like vehicle protocol
// ---------------------------------------------------------------------------
//
// The vehicle speaks proprietary NMEA-style sentences. Commands go out as
// `$PMARMAN,<fx>,<fy>,<tz>*hh\r\n` (manual-control mode; must be refreshed
// within 3 s or the vehicle reverts to drift) and `$PMARABT\r\n` (explicit
// drift, sent without a checksum). Telemetry arrives as bursts of
// whitespace-separated sentences.

/// XOR checksum over a sentence payload (the bytes between `$` and `*`),
/// rendered as two lowercase hex digits.
pub fn checksum(payload: &str) -> String {
    let mut c = 0u8;
    for byte in payload.bytes() {
        c ^= byte;
    }
    format!("{c:02x}")
}

/// Encode a manual-control-mode command. Forces in N, torque in N m,
/// rounded to two decimals on the wire.
pub fn encode_manual_command(force_x: f64, force_y: f64, torque_z: f64) -> String {
    let payload = format!("PMARMAN,{force_x:.2},{force_y:.2},{torque_z:.2}");
    let cs = checksum(&payload);
    format!("${payload}*{cs}\r\n")
}

/// The explicit zero-thrust command. The vehicle accepts this one bare.
pub fn drift_sentence() -> &'static str {
    "$PMARABT\r\n"
}

/// One decoded telemetry burst: position fix, orientation, angular rates and
/// the fuel indicator, exactly as the vehicle reports them (degrees on the
/// attitude channels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    pub latitude: f64,
    pub longitude: f64,
    /// Course over ground (deg).
    pub course: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
    pub roll_rate: f64,
    pub pitch_rate: f64,
    pub yaw_rate: f64,
    /// Remaining battery/fuel fraction as reported (percent).
    pub fuel: f64,
}

/// Decode a telemetry burst into a frame.
///
/// The burst is split on whitespace and the last token dropped (it is
/// usually truncated mid-sentence); for each sentence type the newest
/// occurrence wins. Validation is all-or-nothing: if any of the three
/// required sentences is missing, fails its checksum, or has malformed
/// fields, the whole burst is discarded and `None` returned, leaving the
/// caller's state untouched.
pub fn parse_burst(burst: &str) -> Option<TelemetryFrame> {
    let mut tokens: Vec<&str> = burst.split_whitespace().collect();
    tokens.pop();

    let mut gps = None;
    let mut imu = None;
    let mut module = None;
    for token in &tokens {
        match token.get(..8) {
            Some("$PMARGPS") => gps = Some(*token),
            Some("$PMARIMU") => imu = Some(*token),
            Some("$PMARMOD") => module = Some(*token),
            Some("$PMARERR") => warn!(sentence = token, "vehicle reported an error"),
            _ => {}
        }
    }

    let gps = fields(gps?)?;
    let imu = fields(imu?)?;
    let module = fields(module?)?;

    let (latitude, longitude) = parse_position(&gps)?;
    let course: f64 = gps.get(8)?.parse().ok()?;

    let parse_at = |v: &[String], i: usize| -> Option<f64> { v.get(i)?.parse().ok() };

    Some(TelemetryFrame {
        latitude,
        longitude,
        course,
        roll_deg: parse_at(&imu, 1)?,
        pitch_deg: parse_at(&imu, 2)?,
        yaw_deg: parse_at(&imu, 3)?,
        roll_rate: parse_at(&imu, 4)?,
        pitch_rate: parse_at(&imu, 5)?,
        yaw_rate: parse_at(&imu, 6)?,
        fuel: parse_at(&module, 2)?,
    })
}

/// Verify a sentence's trailing checksum and split its payload fields.
fn fields(sentence: &str) -> Option<Vec<String>> {
    let payload = sentence.strip_prefix('$')?;
    let (payload, cs) = payload.rsplit_once('*')?;
    if checksum(payload) != cs.to_lowercase() {
        warn!(sentence, "checksum mismatch, dropping telemetry burst");
        return None;
    }
    Some(payload.split(',').map(str::to_owned).collect())
}

/// Latitude/longitude from the ddmm.mmmm / dddmm.mmmm fix fields plus their
/// hemisphere letters.
///
/// The fields are wire-controlled text, so every split goes through
/// `str::get`; anything that is not cleanly sliceable and parseable drops
/// the burst instead of panicking the control thread.
fn parse_position(gps: &[String]) -> Option<(f64, f64)> {
    let lat_field = gps.get(2)?;
    let lon_field = gps.get(4)?;

    let lat_deg: f64 = lat_field.get(..2)?.parse().ok()?;
    let lat_min: f64 = lat_field.get(2..)?.parse().ok()?;
    let lon_deg: f64 = lon_field.get(..3)?.parse().ok()?;
    let lon_min: f64 = lon_field.get(3..)?.parse().ok()?;

    let mut latitude = lat_deg + (lat_min / 100.0) / 0.6;
    let mut longitude = lon_deg + (lon_min / 100.0) / 0.6;
    if gps.get(3)?.as_str() == "S" {
        latitude = -latitude;
    }
    if gps.get(5)?.as_str() == "W" {
        longitude = -longitude;
    }
    Some((latitude, longitude))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // A well-formed burst; the trailing "$PMARGP" simulates the truncated
    // final token every real burst carries.
    const BURST: &str = "\
        $PMARGPS,123519,6326.3043,N,01021.4567,E,1,08,0.9,12.4*50 \
        $PMARIMU,2.5,-1.0,45.0,0.1,0.2,0.3*45 \
        $PMARMOD,man,87.5*3e \
        $PMARGP";

    #[test]
    fn checksum_matches_known_vector() {
        assert_eq!(checksum("PMARMAN,10.00,0.00,5.00"), "4a");
    }

    #[test]
    fn manual_command_is_framed_and_checksummed() {
        let s = encode_manual_command(10.0, 0.0, 5.0);
        assert_eq!(s, "$PMARMAN,10.00,0.00,5.00*4a\r\n");
    }

    #[test]
    fn drift_carries_no_checksum() {
        assert_eq!(drift_sentence(), "$PMARABT\r\n");
    }

    #[test]
    fn burst_parses_all_three_sentences() {
        let frame = parse_burst(BURST).unwrap();
        assert!((frame.latitude - (63.0 + (26.3043 / 100.0) / 0.6)).abs() < 1e-12);
        assert!((frame.longitude - (10.0 + (21.4567 / 100.0) / 0.6)).abs() < 1e-12);
        assert_eq!(frame.course, 0.9);
        assert_eq!(frame.yaw_deg, 45.0);
        assert_eq!(frame.yaw_rate, 0.3);
        assert_eq!(frame.fuel, 87.5);
    }

    #[test]
    fn southern_western_hemispheres_negate() {
        let payload = "PMARGPS,123519,6326.3043,S,01021.4567,W,1,08,0.9,12.4";
        let gps = format!("${payload}*{} ", checksum(payload));
        let imu = "$PMARIMU,2.5,-1.0,45.0,0.1,0.2,0.3*45 ";
        let burst = format!("{gps}{imu}$PMARMOD,man,87.5*3e x");
        let frame = parse_burst(&burst).unwrap();
        assert!(frame.latitude < 0.0);
        assert!(frame.longitude < 0.0);
    }

    #[test]
    fn corrupted_checksum_discards_the_whole_burst() {
        let corrupted = BURST.replace("*45", "*46");
        assert!(parse_burst(&corrupted).is_none());
    }

    #[test]
    fn missing_sentence_discards_the_burst() {
        let no_imu = "$PMARGPS,123519,6326.3043,N,01021.4567,E,1,08,0.9,12.4*50 \
                      $PMARMOD,man,87.5*3e x";
        assert!(parse_burst(no_imu).is_none());
    }

    #[test]
    fn multibyte_garbage_in_fix_field_is_dropped_not_fatal() {
        // Checksum-valid sentence whose latitude field starts mid-character;
        // must come back as "no frame", never a slice panic
        let burst = "$PMARGPS,123519,a\u{fc}26.3043,N,01021.4567,E,1,08,0.9,12.4*4b \
                     $PMARIMU,2.5,-1.0,45.0,0.1,0.2,0.3*45 \
                     $PMARMOD,man,87.5*3e x";
        assert!(parse_burst(burst).is_none());
    }

    #[test]
    fn truncated_last_token_is_ignored() {
        // The MOD sentence arrives last and incomplete: burst is unusable
        let burst = "$PMARGPS,123519,6326.3043,N,01021.4567,E,1,08,0.9,12.4*50 \
                     $PMARIMU,2.5,-1.0,45.0,0.1,0.2,0.3*45 \
                     $PMARMOD,man,87";
        assert!(parse_burst(burst).is_none());
    }
}
