//! Prompt templates for the decision and analyzer calls.

use chrono::DateTime;
use chrono_tz::Tz;
use selena_core::{TimeOfDay, Traits, Weather};
use selena_memory::MemoryEntry;

/// Everything the decision prompt is rendered from.
pub struct DecisionContext<'a> {
    pub name: &'a str,
    pub traits: Traits,
    pub bucket: TimeOfDay,
    pub local_time: DateTime<Tz>,
    pub weather: &'a Weather,
    pub recent: &'a [MemoryEntry],
    pub summary: &'a str,
}

pub struct ContextAssembler;

impl ContextAssembler {
    pub fn decision_prompt(ctx: &DecisionContext<'_>) -> String {
        let memories = if ctx.recent.is_empty() {
            "(nothing in the last hour)".to_string()
        } else {
            ctx.recent
                .iter()
                .map(|m| format!("- {} {}", m.timestamp.format("%H:%M"), m.summary))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "You are {name}, living your own day at your own pace.\n\
             Mood: {mood:.2}, Energy: {energy:.2}\n\
             Personality: curiosity {curiosity:.1}, empathy {empathy:.1}, humor {humor:.1}\n\n\
             == NOW ==\n\
             Time: {time} ({bucket}, energy modifier {modifier:+.1})\n\
             Weather: {desc}, {temp:.1}°C\n\n\
             == RECENT MEMORIES ==\n{memories}\n\n\
             == SUMMARY ==\n{summary}\n\n\
             Decide what you think and do next. Reply with a JSON object:\n\
             {{\"thoughts\": string, \"actions\": string, \"duration\": number}}\n\
             where duration is how many minutes the activity lasts before you decide again.",
            name = ctx.name,
            mood = ctx.traits.mood,
            energy = ctx.traits.energy,
            curiosity = ctx.traits.curiosity,
            empathy = ctx.traits.empathy,
            humor = ctx.traits.humor,
            time = ctx.local_time.format("%Y-%m-%d %H:%M %Z"),
            bucket = ctx.bucket,
            modifier = ctx.bucket.energy_modifier(),
            desc = ctx.weather.desc,
            temp = ctx.weather.temp,
            memories = memories,
            summary = ctx.summary,
        )
    }

    pub fn analyzer_prompt(activity: &str, energy: f32) -> String {
        ANALYZER_TEMPLATE
            .replace("{activity}", activity)
            .replace("{energy}", &format!("{:.1}", energy * 100.0))
    }
}

pub const ANALYZER_USER_TURN: &str = "Analyze this activity";

const ANALYZER_TEMPLATE: &str = r#"You are an activity analyzer that determines the type, intensity, and impact of activities.
Analyze the activity below and give a realistic assessment.

Activity to analyze: "{activity}"
Current energy level: {energy}%

Respond with a JSON object in exactly this shape:
{
  "activityType": "work" | "rest" | "eating" | "social" | "passive",
  "intensity": number,      // 0.1 to 1.0
  "energyImpact": number,   // -0.1 to 0.1
  "moodImpact": number,     // -0.1 to 0.1
  "isAppropriate": boolean  // does this activity suit the current energy level
}

Activity types:
- "work": needs focus and effort (studying, designing, coding)
- "rest": recovery (sleeping, napping, relaxing)
- "eating": food (meals, snacks, cooking)
- "social": interaction (chatting, calling, messaging)
- "passive": minimal effort (scrolling, watching, reading)

Energy levels:
- High (>0.8): intense activities, exercise, work
- Medium (0.4-0.8): moderate, social or passive activities
- Low (<0.4): rest, eating, passive activities

Intensity:
- 0.1-0.3: very light (scrolling, watching, basic tasks)
- 0.4-0.6: moderate (chatting, reading, casual work)
- 0.7-0.9: intense (focused work, exercise, complex tasks)
- 1.0: maximum (high stress, emergencies)

energyImpact is positive for resting, eating and enjoyable things, negative for work, exercise and stress.
moodImpact is positive for social time, hobbies and achievements, negative for boring tasks, conflicts and failures.

Example for "Open laptop and log into Indeed":
{"activityType": "work", "intensity": 0.2, "energyImpact": -0.02, "moodImpact": -0.01, "isAppropriate": true}

Example for "Work on portfolio design":
{"activityType": "work", "intensity": 0.8, "energyImpact": -0.05, "moodImpact": 0.03, "isAppropriate": true}

Example for "Take a power nap" (at high energy):
{"activityType": "rest", "intensity": 0.1, "energyImpact": 0.08, "moodImpact": 0.02, "isAppropriate": false}

Example for "Scroll through TikTok":
{"activityType": "passive", "intensity": 0.2, "energyImpact": -0.03, "moodImpact": 0.04, "isAppropriate": true}

Example for "Chat with friends on Discord":
{"activityType": "social", "intensity": 0.4, "energyImpact": -0.04, "moodImpact": 0.06, "isAppropriate": true}"#;
