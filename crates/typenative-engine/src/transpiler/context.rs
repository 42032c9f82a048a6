//! Per-call lowering context
//!
//! `LowerCtx` travels down the recursive lowering calls by reference. Rules
//! that need a variation clone it and adjust the clone; nothing is shared
//! between sibling subtrees.

use super::types::TypeDesc;

/// Names bound by a `new Promise((resolve, reject) => …)` executor
#[derive(Debug, Clone, PartialEq)]
pub struct Resolver {
    pub resolve: String,
    pub reject: Option<String>,
    /// Queue the executor settles
    pub queue: String,
    /// Declared payload of the promise
    pub payload: TypeDesc,
}

/// Enclosing function information
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionFrame {
    /// Declared (or inferred) result type, already unwrapped from Promise
    pub return_type: Option<TypeDesc>,
    /// Payload of the declared `Promise<T>`, if any
    pub promise_payload: Option<TypeDesc>,
    /// Enclosing class, for `this` and `super`
    pub class: Option<String>,
    /// True inside a synthesized constructor, where `return` yields `this`
    pub constructor: bool,
    /// True inside a constructor of a derived class
    pub derived_constructor: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LowerCtx {
    /// Emit a simple statement without a terminator, for `for` clauses
    pub inline: bool,
    /// Lines injected right after the next block's opening brace
    pub block_prefix: Vec<String>,
    /// Lines injected right before the next block's closing brace
    pub block_suffix: Vec<String>,
    /// Declarations are emitted at package level rather than as closures
    pub hoisted: bool,
    /// Type the surrounding construct expects from this expression
    pub expected: Option<TypeDesc>,
    pub function: FunctionFrame,
    pub resolver: Option<Resolver>,
}

impl LowerCtx {
    /// Context for package-level declarations
    pub fn hoisted() -> Self {
        Self {
            hoisted: true,
            ..Default::default()
        }
    }

    /// Same context expecting `ty` from the next expression
    pub fn expecting(&self, ty: Option<TypeDesc>) -> Self {
        let mut ctx = self.for_child();
        ctx.expected = ty;
        ctx
    }

    /// Same context with per-node fields cleared
    pub fn for_child(&self) -> Self {
        Self {
            inline: false,
            block_prefix: Vec::new(),
            block_suffix: Vec::new(),
            hoisted: false,
            expected: None,
            function: self.function.clone(),
            resolver: self.resolver.clone(),
        }
    }

    /// Context for a statement in inline position (`for` init and update)
    pub fn inline(&self) -> Self {
        let mut ctx = self.for_child();
        ctx.inline = true;
        ctx
    }

    /// Context for the body of a new function
    pub fn for_function(&self, frame: FunctionFrame) -> Self {
        let mut ctx = self.for_child();
        ctx.function = frame;
        ctx
    }

    pub fn with_block_prefix(mut self, lines: Vec<String>) -> Self {
        self.block_prefix = lines;
        self
    }

    pub fn with_block_suffix(mut self, lines: Vec<String>) -> Self {
        self.block_suffix = lines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_context_drops_block_injection() {
        let ctx = LowerCtx::hoisted()
            .with_block_prefix(vec!["this := &Foo{}".to_string()])
            .with_block_suffix(vec!["return this".to_string()]);
        let child = ctx.for_child();
        assert!(child.block_prefix.is_empty());
        assert!(child.block_suffix.is_empty());
        assert!(!child.hoisted);
    }

    #[test]
    fn test_function_frame_is_inherited() {
        let frame = FunctionFrame {
            return_type: Some(TypeDesc::String),
            ..Default::default()
        };
        let ctx = LowerCtx::default().for_function(frame.clone());
        let nested = ctx.expecting(Some(TypeDesc::Number));
        assert_eq!(nested.function, frame);
        assert_eq!(nested.expected, Some(TypeDesc::Number));
    }
}
