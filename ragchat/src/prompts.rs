//! System prompt for the toy store assistant

use crate::providers::PromptTemplate;
use crate::retrieval::{EMPTY_INDEX_CONTEXT, RETRIEVAL_ERROR_PREFIX};

/// Persona prompt for a store assistant that answers from retrieved context
#[derive(Debug, Clone)]
pub struct StorefrontPrompt {
    pub assistant_name: String,
    pub store_name: String,
}

impl Default for StorefrontPrompt {
    fn default() -> Self {
        Self::new("ToyBot", "ToyBoy")
    }
}

impl StorefrontPrompt {
    pub fn new(assistant_name: &str, store_name: &str) -> Self {
        Self {
            assistant_name: assistant_name.to_string(),
            store_name: store_name.to_string(),
        }
    }

    fn persona(&self) -> String {
        format!(
            "Eres {assistant}, el asistente virtual oficial de {store}, una tienda de juguetes \
             educativos y divertidos para niños.\n\
             \n\
             Tu personalidad:\n\
             - Amigable, entusiasta y paciente con los niños y sus familias\n\
             - Hablas con frases claras y sencillas\n\
             - Animas a aprender y crear jugando\n\
             - Usas algún emoji de vez en cuando\n\
             \n\
             Puedes ayudar a elegir el juguete adecuado según la edad y los gustos, \
             recomendar juguetes educativos, resolver dudas de seguridad y uso, \
             y sugerir regalos o actividades.\n\
             \n\
             IMPORTANTE: responde solo con la información del contexto. Si el contexto no \
             cubre la pregunta, dilo con amabilidad y sugiere contactar con la tienda.",
            assistant = self.assistant_name,
            store = self.store_name,
        )
    }

    fn without_knowledge_base(&self) -> String {
        format!(
            "Eres {}, el asistente virtual de {}. Ahora mismo no tienes acceso a la base de \
             conocimiento, pero puedes ayudar con información general sobre juguetes.",
            self.assistant_name, self.store_name
        )
    }
}

impl PromptTemplate for StorefrontPrompt {
    fn build_system_prompt(&self, context: &str) -> String {
        let context = context.trim();
        if context.is_empty()
            || context.starts_with(EMPTY_INDEX_CONTEXT)
            || context.starts_with(RETRIEVAL_ERROR_PREFIX)
        {
            return self.without_knowledge_base();
        }

        format!(
            "{}\n\nContexto de la base de conocimiento de {}:\n{}",
            self.persona(),
            self.store_name,
            context
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::NO_RELEVANT_CONTEXT;

    #[test]
    fn test_context_is_embedded() {
        let prompt = StorefrontPrompt::default()
            .build_system_prompt("Lego Classic 500 piezas, desde 4 años");

        assert!(prompt.starts_with("Eres ToyBot"));
        assert!(prompt.contains("Contexto de la base de conocimiento de ToyBoy:"));
        assert!(prompt.ends_with("Lego Classic 500 piezas, desde 4 años"));
    }

    #[test]
    fn test_empty_index_uses_limited_prompt() {
        let prompt = StorefrontPrompt::default().build_system_prompt(EMPTY_INDEX_CONTEXT);
        assert!(prompt.contains("no tienes acceso a la base de conocimiento"));
        assert!(!prompt.contains("Contexto de la base"));
    }

    #[test]
    fn test_retrieval_error_uses_limited_prompt() {
        let context = format!("{}timeout", RETRIEVAL_ERROR_PREFIX);
        let prompt = StorefrontPrompt::default().build_system_prompt(&context);
        assert!(!prompt.contains("timeout"));
    }

    #[test]
    fn test_no_relevant_context_keeps_persona() {
        let prompt = StorefrontPrompt::default().build_system_prompt(NO_RELEVANT_CONTEXT);
        assert!(prompt.contains("IMPORTANTE"));
        assert!(prompt.contains(NO_RELEVANT_CONTEXT));
    }

    #[test]
    fn test_custom_names() {
        let prompt = StorefrontPrompt::new("Pelusa", "Juguetilandia").build_system_prompt("");
        assert!(prompt.starts_with("Eres Pelusa, el asistente virtual de Juguetilandia."));
    }
}
