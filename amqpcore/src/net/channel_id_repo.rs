use amqp_wire::types::{AmqpChannelId, ShortUint};

const INITIAL_BIT_MASK: u8 = 0b1000_0000;
// bitmap covers every id a peer can negotiate
const BITMAP_LEN: usize = (ShortUint::MAX as usize + 7) / 8;

pub(crate) struct ChannelIdRepository {
    /// Each bit represent two states: 1: occupied, 0: free.
    /// Real id is calculated by byte postion in Vec + bit postion in byte.
    id_state: Vec<u8>,
    /// Largest id which can be allocated.
    limit: ShortUint,
}

impl ChannelIdRepository {
    pub fn new(limit: ShortUint) -> Self {
        Self {
            id_state: vec![0; BITMAP_LEN],
            limit,
        }
    }

    /// Change the largest id which can be allocated, ids already in use are kept.
    pub fn set_limit(&mut self, limit: ShortUint) {
        self.limit = limit;
    }

    fn is_free(&self, pos: usize, mask: u8) -> bool {
        (mask & self.id_state[pos]) == 0
    }

    fn set_occupied(&mut self, pos: usize, mask: u8) {
        self.id_state[pos] |= mask;
    }

    fn set_free(&mut self, pos: usize, mask: u8) {
        self.id_state[pos] &= !mask;
    }

    fn get_pos_mask(&self, id: AmqpChannelId) -> (usize, u8) {
        let pos = (id as usize - 1) / 8;
        let mask = INITIAL_BIT_MASK >> ((id - 1) % 8);
        (pos, mask)
    }

    /// Allocate the lowest free id, `None` if all ids up to the limit are in use.
    pub fn allocate(&mut self) -> Option<AmqpChannelId> {
        let last_pos = (self.limit as usize).checked_sub(1)? / 8;
        let pos = self.id_state[..=last_pos]
            .iter()
            .position(|&v| v != 0b1111_1111)?;
        for i in 0..8 {
            let mask = INITIAL_BIT_MASK >> i;
            if self.is_free(pos, mask) {
                // calculate the real id
                let channel_id = pos * 8 + i + 1;
                if channel_id > self.limit as usize {
                    return None;
                }
                // mark it as occupied
                self.set_occupied(pos, mask);
                return Some(channel_id as AmqpChannelId);
            }
        }
        None
    }

    /// true: OK, false: already released
    pub fn release(&mut self, id: AmqpChannelId) -> bool {
        if id == 0 {
            // connection's default channel 0 is never allocated
            return false;
        }
        let (pos, mask) = self.get_pos_mask(id);
        if self.is_free(pos, mask) {
            // already released
            false
        } else {
            self.set_free(pos, mask);
            true
        }
    }

    /// true: OK, false: already reserved
    #[cfg(test)]
    pub fn reserve(&mut self, id: AmqpChannelId) -> bool {
        if id == 0 {
            return false;
        }
        let (pos, mask) = self.get_pos_mask(id);

        if !self.is_free(pos, mask) {
            // already occupied
            false
        } else {
            self.set_occupied(pos, mask);
            true
        }
    }
}
