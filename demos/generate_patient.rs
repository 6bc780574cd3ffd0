// demos/generate_patient.rs
//! Generates one built-in patient and prints what each channel looks like

use vitalsim_core::simulation::{ChannelRecord, ChannelStream, PatientProfile};
use vitalsim_core::{FixtureConfig, PatientOrchestrator, PatientReport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Vitalsim Patient Demo");
    println!("=====================\n");

    let config = FixtureConfig::default();
    let orchestrator = PatientOrchestrator::new(config)?;
    let patient = PatientProfile::patient_001();

    println!("Reference instant: {}", orchestrator.reference());
    let dataset = orchestrator.generate_patient(&patient);
    print!("{}", PatientReport::from_profile(&patient).with_dataset(&dataset));

    println!("\nFirst records per channel:");
    preview("heart_rate", &dataset.heart_rate)?;
    preview("movement", &dataset.movement)?;
    preview("blood_oxygen", &dataset.blood_oxygen)?;
    preview("temperature", &dataset.temperature)?;
    preview("load", &dataset.load)?;

    println!("\nHeart rate clock drift: {:+.2e}", dataset.heart_rate.drift.rate());
    Ok(())
}

fn preview<R: ChannelRecord>(name: &str, stream: &ChannelStream<R>) -> Result<(), Box<dyn std::error::Error>> {
    println!("  {} ({} records, {} faults)", name, stream.len(), stream.fault_count);
    for emission in stream.emissions.iter().take(3) {
        println!(
            "    t={:>8.3}s  {}",
            emission.elapsed_s,
            serde_json::to_string(&emission.record)?
        );
    }
    Ok(())
}
