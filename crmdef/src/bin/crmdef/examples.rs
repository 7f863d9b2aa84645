use crate::commands::{apply, fields, objects, records, shell, validate};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "objects",
            groups: objects::EXAMPLES,
        },
        CommandExample {
            name: "fields",
            groups: fields::EXAMPLES,
        },
        CommandExample {
            name: "records",
            groups: records::EXAMPLES,
        },
        CommandExample {
            name: "validate",
            groups: validate::EXAMPLES,
        },
        CommandExample {
            name: "apply",
            groups: apply::EXAMPLES,
        },
        CommandExample {
            name: "shell",
            groups: shell::EXAMPLES,
        },
    ]
}
