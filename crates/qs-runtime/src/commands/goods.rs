use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;
use crate::world::TradeMode;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("AddGoods", Arity::range(1, 2), add_goods);
    registry.register("DelGoods", Arity::range(1, 2), del_goods);
    registry.register("EquipGoods", Arity::exact(1), equip_goods);
    registry.register("AddMoney", Arity::exact(1), add_money);
    registry.register("SetMoneyNum", Arity::exact(1), set_money_num);
    registry.register("GetMoneyNum", Arity::exact(1), get_money_num);
    registry.register("GetGoodsNum", Arity::exact(2), get_goods_num);
    registry.register("BuyGoods", Arity::exact(1), buy_goods);
    registry.register("SellGoods", Arity::range(0, 1), sell_goods);
}

fn add_goods(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.text(0)?;
    let count = ctx.int_or(1, 1)?;
    ctx.world.add_goods(&name, count);
    Ok(Flow::Continue)
}

fn del_goods(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.text(0)?;
    let count = ctx.int_or(1, 1)?;
    ctx.world.remove_goods(&name, count);
    Ok(Flow::Continue)
}

fn equip_goods(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.text(0)?;
    ctx.world.equip_goods(&name);
    Ok(Flow::Continue)
}

fn add_money(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let amount = ctx.int(0)?;
    ctx.world.add_money(amount);
    Ok(Flow::Continue)
}

fn set_money_num(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let amount = ctx.int(0)?;
    ctx.world.set_money(amount);
    Ok(Flow::Continue)
}

fn get_money_num(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let money = ctx.world.money();
    ctx.world.set_variable(name, money);
    Ok(Flow::Continue)
}

/// `GetGoodsNum($var, goods)`.
fn get_goods_num(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let goods = ctx.text(1)?;
    let count = ctx.world.goods_count(&goods);
    ctx.world.set_variable(name, count);
    Ok(Flow::Continue)
}

fn buy_goods(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let list = ctx.text(0)?;
    ctx.world.open_trade_menu(TradeMode::Buy, &list);
    Ok(ctx.suspend(WaitReason::BuyMenu))
}

fn sell_goods(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let list = ctx.text_or(0, "")?;
    ctx.world.open_trade_menu(TradeMode::Sell, &list);
    Ok(ctx.suspend(WaitReason::BuyMenu))
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::harness;
    use crate::engine::ChainStatus;

    #[test]
    fn goods_and_money_flow_through_world_state() {
        let mut h = harness(&[(
            "main.txt",
            "AddGoods(\"Herb\", 3);\nAddGoods(\"Sword\");\nDelGoods(\"Herb\");\nEquipGoods(\"Sword\");\nAddMoney(50);\nAddMoney(-20);\nGetMoneyNum($cash);\nGetGoodsNum($herbs, \"Herb\");\nSetMoneyNum(7);",
        )]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.var("cash"), 30);
        assert_eq!(h.var("herbs"), 2);
        assert_eq!(h.world.borrow().money, 7);
        assert_eq!(h.world.borrow().goods.get("Sword"), Some(&1));
        assert!(h.calls().contains(&"equip Sword".to_string()));
    }

    #[test]
    fn trade_menus_block_until_closed() {
        let mut h = harness(&[(
            "main.txt",
            "BuyGoods(\"shop1.ini\");\nSellGoods();\nMessage(\"bye\");",
        )]);
        h.world.borrow_mut().block("trade");
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["trade Buy shop1.ini"]);
        assert_eq!(h.engine.status(), ChainStatus::Suspended);

        h.world.borrow_mut().unblock("trade");
        h.engine.update(16);
        h.engine.update(16);
        assert_eq!(
            h.calls(),
            vec!["trade Buy shop1.ini", "trade Sell ", "message bye"]
        );
    }
}
