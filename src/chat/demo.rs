// Demo mode: canned replies for signed-out users
//
// Without a session the client never contacts the backend. Instead each
// message gets a short explanation of what the full product would do, after
// a delay that mimics a real round trip.

use crate::model::AgentMode;

/// How much of the user's question is echoed back
const ECHO_CHARS: usize = 60;

/// Build the demo reply for `query`
pub fn demo_reply(query: &str, agent: AgentMode) -> String {
    let mut echoed: String = query.chars().take(ECHO_CHARS).collect();
    if query.chars().count() > ECHO_CHARS {
        echoed.push('…');
    }

    format!(
        "**{label} (Demo Mode)**\n\n\
         I received your query: *\"{echoed}\"*\n\n\
         To get AI-powered responses with full Indian legal analysis, please:\n\n\
         1. **Sign up** for a free account\n\
         2. **Configure** your OpenAI API key in the backend\n\
         3. **Ask anything** about Indian law, compliance, or business risk\n\n\
         > This is a demonstration response. The full system provides detailed legal \
         analysis with section citations, compliance checklists, and risk scoring.",
        label = agent.label(),
    )
}
