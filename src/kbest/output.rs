use crate::forest::Slot;

use super::KBestEntry;

impl<'a, 'f> KBestEntry<'a, 'f> {
    /// Target words of this derivation, in output order.
    ///
    /// Walks the alternative's slots: terminals are emitted as-is and each
    /// non-terminal is replaced by the output of the child derivation its
    /// back-pointer selects.
    pub fn words(&self) -> Vec<&'f str> {
        let mut out = Vec::new();
        self.collect_words(&mut out);
        out
    }

    fn collect_words(&self, out: &mut Vec<&'f str>) {
        let children = self.children();
        let mut next_child = 0;
        for slot in self.slots() {
            match slot {
                Slot::Terminal(text) => {
                    out.extend(text.split_whitespace());
                }
                Slot::NonTerminal { .. } => {
                    children[next_child].collect_words(out);
                    next_child += 1;
                }
            }
        }
    }

    /// The output phrase: target words joined by single spaces.
    pub fn output(&self) -> String {
        self.words().join(" ")
    }

    /// Bracketed derivation tree, e.g. `(S (X the) (X house))`.
    ///
    /// The node label is followed by the rule name in brackets when the
    /// alternative carries one.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out);
        out
    }

    fn write_tree(&self, out: &mut String) {
        let forest = self.list.forest();
        let node = forest.node(self.node());
        let alt = &node.alternatives[self.derivation().alternative()];

        out.push('(');
        out.push_str(&node.label);
        if let Some(rule) = &alt.rule {
            out.push('[');
            out.push_str(rule);
            out.push(']');
        }

        let children = self.children();
        let mut next_child = 0;
        for slot in &alt.slots {
            match slot {
                Slot::Terminal(text) => {
                    for word in text.split_whitespace() {
                        out.push(' ');
                        out.push_str(word);
                    }
                }
                Slot::NonTerminal { .. } => {
                    out.push(' ');
                    children[next_child].write_tree(out);
                    next_child += 1;
                }
            }
        }
        out.push(')');
    }

    fn slots(&self) -> &'f [Slot] {
        let forest = self.list.forest();
        let alt = self.derivation().alternative();
        &forest.node(self.node()).alternatives[alt].slots
    }
}
