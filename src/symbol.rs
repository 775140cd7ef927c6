use std::collections::HashMap;

/// Bidirectional label table. Many names may share an address; the most
/// recently added one is the primary name the disassembler shows. A name
/// maps to at most one address.
pub struct SymbolTable {
    by_name: HashMap<String, u16>,
    at_addr: HashMap<u16, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            at_addr: HashMap::new(),
        }
    }

    /// Bind `name` to `addr`. When the name is already bound elsewhere and
    /// `replace` is set, the old binding is dropped; without `replace` the
    /// existing binding wins.
    pub fn add(&mut self, name: &str, addr: u16, replace: bool) {
        if let Some(&existing) = self.by_name.get(name) {
            if existing == addr {
                return;
            }
            if !replace {
                return;
            }
            self.unlink(name, existing);
        }
        self.by_name.insert(name.to_string(), addr);
        self.at_addr
            .entry(addr)
            .or_insert_with(Vec::new)
            .push(name.to_string());
    }

    pub fn find_by_name(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    pub fn primary_name_at(&self, addr: u16) -> Option<&str> {
        self.at_addr
            .get(&addr)
            .and_then(|names| names.last())
            .map(String::as_str)
    }

    /// Drop every name bound to `addr`.
    pub fn remove_all_at(&mut self, addr: u16) {
        if let Some(names) = self.at_addr.remove(&addr) {
            for name in names {
                self.by_name.remove(&name);
            }
        }
    }

    /// Drop every name bound inside `[start, end)`, wrapping modulo 2^16.
    /// Object loads squash their target range before new symbols arrive.
    pub fn squash_range(&mut self, start: u16, end: u16) {
        let mut addr = start;
        while addr != end {
            self.remove_all_at(addr);
            addr = addr.wrapping_add(1);
        }
    }

    pub fn remove_all(&mut self) {
        self.by_name.clear();
        self.at_addr.clear();
    }

    fn unlink(&mut self, name: &str, addr: u16) {
        if let Some(names) = self.at_addr.get_mut(&addr) {
            names.retain(|n| n != name);
            if names.is_empty() {
                self.at_addr.remove(&addr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_both_directions() {
        let mut table = SymbolTable::new();
        table.add("LOOP", 0x3004, true);

        assert_eq!(table.find_by_name("LOOP"), Some(0x3004));
        assert_eq!(table.primary_name_at(0x3004), Some("LOOP"));
        assert_eq!(table.find_by_name("loop"), None);
        assert_eq!(table.primary_name_at(0x3005), None);
    }

    #[test]
    fn last_added_name_is_primary() {
        let mut table = SymbolTable::new();
        table.add("FIRST", 0x3000, true);
        table.add("SECOND", 0x3000, true);

        assert_eq!(table.primary_name_at(0x3000), Some("SECOND"));
        assert_eq!(table.find_by_name("FIRST"), Some(0x3000));
    }

    #[test]
    fn rebinding_moves_a_name() {
        let mut table = SymbolTable::new();
        table.add("START", 0x3000, true);
        table.add("START", 0x4000, true);

        assert_eq!(table.find_by_name("START"), Some(0x4000));
        assert_eq!(table.primary_name_at(0x3000), None);
        assert_eq!(table.primary_name_at(0x4000), Some("START"));
    }

    #[test]
    fn rebinding_without_replace_keeps_original() {
        let mut table = SymbolTable::new();
        table.add("START", 0x3000, true);
        table.add("START", 0x4000, false);

        assert_eq!(table.find_by_name("START"), Some(0x3000));
    }

    #[test]
    fn squash_removes_range_with_wrap() {
        let mut table = SymbolTable::new();
        table.add("LOW", 0xfffe, true);
        table.add("HIGH", 0x0001, true);
        table.add("SAFE", 0x0002, true);

        table.squash_range(0xfffe, 0x0002);

        assert_eq!(table.find_by_name("LOW"), None);
        assert_eq!(table.find_by_name("HIGH"), None);
        assert_eq!(table.find_by_name("SAFE"), Some(0x0002));
    }

    #[test]
    fn remove_at_addr_removes_every_alias() {
        let mut table = SymbolTable::new();
        table.add("A", 0x3000, true);
        table.add("B", 0x3000, true);

        table.remove_all_at(0x3000);

        assert_eq!(table.find_by_name("A"), None);
        assert_eq!(table.find_by_name("B"), None);
        assert_eq!(table.primary_name_at(0x3000), None);
    }
}
