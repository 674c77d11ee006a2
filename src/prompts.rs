//! Fixed prompt table for the six safety scenarios
//!
//! Stage 1 ("vision") prompts ask for an open description; stage 2
//! ("validation") prompts fold the stage-1 narrative into a closed
//! yes/no question.

use crate::record::Scenario;

/// Stage-1 open-ended prompt for a scenario.
pub fn vision_prompt(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::SmokeDetection => {
            "Analyze this image carefully. Do you see any smoke, steam, or smoke-like substances visible? Look for white, gray, or dark clouds of smoke, steam from machinery, or any other smoke-like emissions. Respond with a clear description of what you observe."
        }
        Scenario::FireDetection => {
            "Examine this image thoroughly. Do you see any fire, flames, or burning materials? Look for visible flames, glowing embers, or signs of combustion. Describe what you observe regarding fire or burning."
        }
        Scenario::FallDetection => {
            "Carefully analyze this image. Do you see any person who appears to have fallen, is lying down, or is in an unusual position that might indicate they have fallen or are in distress? Look for people on the ground, in awkward positions, or showing signs of injury."
        }
        Scenario::DebrisDetection => {
            "Examine this image for any debris, scattered objects, or hazardous materials on the ground or floor. Look for broken equipment, spilled materials, loose objects, or anything that could pose a safety hazard or obstruction."
        }
        Scenario::MissingFireExtinguisher => {
            "Look at this image and check if there is a fire extinguisher present in its designated location. Fire extinguishers are typically red cylinders mounted on walls or in cabinets. Is the fire extinguisher visible in its expected location?"
        }
        Scenario::UnattendedObject => {
            "Analyze this image for any unattended objects, suspicious items, or objects that appear to be left behind. Look for bags, packages, tools, or other items that seem to be abandoned or left unattended in the area."
        }
    }
}

/// Stage-2 template with a `{vision_response}` placeholder.
fn validation_template(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::SmokeDetection => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Is there smoke or smoke-like substance detected in the image?"
        }
        Scenario::FireDetection => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Is there fire or flames detected in the image?"
        }
        Scenario::FallDetection => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Is there a person who has fallen or appears to be in a dangerous position?"
        }
        Scenario::DebrisDetection => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Is there debris, obstacles, or hazardous materials detected on the ground?"
        }
        Scenario::MissingFireExtinguisher => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Is the fire extinguisher present in its designated location?"
        }
        Scenario::UnattendedObject => {
            "Based on this vision analysis: '{vision_response}', answer with ONLY 'yes' or 'no': Are there unattended objects or suspicious items detected in the image?"
        }
    }
}

/// Stage-2 confirmation prompt with the stage-1 narrative folded in.
pub fn validation_prompt(scenario: Scenario, vision_response: &str) -> String {
    validation_template(scenario).replace("{vision_response}", vision_response)
}

/// Short description used by the scenarios endpoint.
pub fn scenario_description(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::SmokeDetection => "Detect smoke or smoke-like substances in the image",
        Scenario::FireDetection => "Detect fire or flames in the image",
        Scenario::FallDetection => "Detect if a person has fallen or is in a dangerous position",
        Scenario::DebrisDetection => {
            "Detect debris, obstacles, or hazardous materials on the ground"
        }
        Scenario::MissingFireExtinguisher => {
            "Check if fire extinguisher is present in designated location"
        }
        Scenario::UnattendedObject => "Detect unattended objects or suspicious items",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_prompt_interpolates_narrative() {
        let prompt = validation_prompt(Scenario::FireDetection, "fire detected");
        assert!(prompt.contains("'fire detected'"));
        assert!(prompt.contains("ONLY 'yes' or 'no'"));
        assert!(!prompt.contains("{vision_response}"));
    }

    #[test]
    fn every_scenario_has_prompts() {
        for scenario in Scenario::ALL {
            assert!(!vision_prompt(scenario).is_empty());
            assert!(validation_template(scenario).contains("{vision_response}"));
            assert!(!scenario_description(scenario).is_empty());
        }
    }
}
