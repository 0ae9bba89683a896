use longmem_core::types::{Memory, TurnRecord};

/// Assembles the distillation prompt: window messages verbatim, a compact
/// listing of every active memory, and instructions enumerating the four
/// actions and their triggers.
pub fn build_prompt(window: &[TurnRecord], active_memories: &[Memory]) -> String {
    let mut out = String::new();

    out.push_str("You are the memory distiller for a long-running conversation.\n");
    out.push_str("Given the recent turns below and the currently active memories, decide\n");
    out.push_str("what to add, update, keep, or expire. Respond with a single JSON object:\n");
    out.push_str("{\"actions\": [ {\"action\": \"add\"|\"update\"|\"keep\"|\"expire\", ... } ]}\n\n");
    out.push_str("Action fields:\n");
    out.push_str("- add: type, category, key, value, confidence, source_turn (first turn in\n");
    out.push_str("  this window where the fact appeared).\n");
    out.push_str("- update: id (target), value and/or confidence. source_turn unchanged.\n");
    out.push_str("- keep: id (target) only — an explicit no-op signaling the memory was\n");
    out.push_str("  considered and retained.\n");
    out.push_str("- expire: id (target) only. Use for explicit contradiction, temporal\n");
    out.push_str("  staleness (completed events, past dates), confidence below 0.5 and\n");
    out.push_str("  unreinforced, duplication, or irrelevance to recent context.\n\n");

    out.push_str("=== WINDOW (chronological) ===\n");
    for turn in window {
        out.push_str(&format!("[{}] {}: {}\n", turn.turn_id, turn.role, turn.content));
    }

    out.push_str("\n=== ACTIVE MEMORIES ===\n");
    if active_memories.is_empty() {
        out.push_str("(none)\n");
    } else {
        for m in active_memories {
            out.push_str(&format!(
                "{} | {} | {} | {} | confidence={:.2}\n",
                m.id, m.mem_type, m.key, m.value, m.confidence
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use longmem_core::types::{MemoryType, Role};

    #[test]
    fn includes_window_turns_and_active_memories() {
        let window = vec![TurnRecord {
            turn_id: 1,
            role: Role::User,
            content: "My name is Alex.".to_string(),
            timestamp: 0.0,
            memories_retrieved: vec![],
        }];
        let memories = vec![Memory {
            id: "m1".into(),
            mem_type: MemoryType::Fact,
            category: "identity".into(),
            key: "name".into(),
            value: "Alex".into(),
            source_turn: 1,
            last_used_turn: 0,
            confidence: 0.9,
            created_at: 0.0,
            updated_at: 0.0,
            is_active: true,
        }];
        let prompt = build_prompt(&window, &memories);
        assert!(prompt.contains("My name is Alex."));
        assert!(prompt.contains("m1 | fact | name | Alex"));
    }

    #[test]
    fn empty_active_memories_says_none() {
        let prompt = build_prompt(&[], &[]);
        assert!(prompt.contains("(none)"));
    }
}
